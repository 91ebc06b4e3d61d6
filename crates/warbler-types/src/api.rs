use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, WarblerError};
use crate::models::UserId;

pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 30;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const MESSAGE_MAX_LEN: usize = 140;

// -- Untyped input --

/// Turn submitted form fields into a JSON object so form posts and JSON
/// payloads go through the same typed constructors. Blank values of the
/// `optional` fields become `null`.
pub fn form_value(fields: HashMap<String, String>, optional: &[&str]) -> Value {
    let map: Map<String, Value> = fields
        .into_iter()
        .map(|(key, val)| {
            if optional.contains(&key.as_str()) && val.trim().is_empty() {
                (key, Value::Null)
            } else {
                (key, Value::String(val))
            }
        })
        .collect();
    Value::Object(map)
}

fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| WarblerError::type_error(format!("{what} must be an object")))
}

fn require_str(obj: &Map<String, Value>, key: &str) -> Result<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(WarblerError::type_error(format!("{key} must be a string"))),
        None => Err(WarblerError::type_error(format!("missing field: {key}"))),
    }
}

fn optional_str(obj: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(WarblerError::type_error(format!(
            "{key} must be a string or null"
        ))),
    }
}

fn require_id(obj: &Map<String, Value>, key: &str) -> Result<UserId> {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| WarblerError::type_error(format!("{key} must be an integer"))),
        Some(_) => Err(WarblerError::type_error(format!("{key} must be an integer"))),
        None => Err(WarblerError::type_error(format!("missing field: {key}"))),
    }
}

// -- Shared value rules --

pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if len == 0 {
        return Err(WarblerError::value("Username is required."));
    }
    if len < USERNAME_MIN_LEN {
        return Err(WarblerError::value(format!(
            "Username must be at least {USERNAME_MIN_LEN} characters."
        )));
    }
    if len > USERNAME_MAX_LEN {
        return Err(WarblerError::value(format!(
            "Username must be at most {USERNAME_MAX_LEN} characters."
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(WarblerError::value("Email is required."));
    }
    if !email.contains('@') {
        return Err(WarblerError::value("Invalid email address."));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(WarblerError::value("Password is required."));
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(WarblerError::value(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters."
        )));
    }
    Ok(())
}

pub fn validate_message_text(text: &str) -> Result<()> {
    let len = text.chars().count();
    if len == 0 {
        return Err(WarblerError::value("Message text is required."));
    }
    if len > MESSAGE_MAX_LEN {
        return Err(WarblerError::value(format!(
            "Message text must be at most {MESSAGE_MAX_LEN} characters."
        )));
    }
    Ok(())
}

// -- Auth --

#[derive(Debug, Clone, PartialEq)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
}

impl SignupRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        image_url: Option<&str>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            image_url: image_url.map(str::to_string),
        }
    }

    /// Type-checks an untyped payload. Missing or mistyped fields are type
    /// errors; values are checked separately by [`SignupRequest::validate`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = object(value, "signup payload")?;
        Ok(Self {
            username: require_str(obj, "username")?,
            email: require_str(obj, "email")?,
            password: require_str(obj, "password")?,
            image_url: optional_str(obj, "image_url")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        if let Some(url) = &self.image_url {
            if url.trim().is_empty() {
                return Err(WarblerError::value("Image URL cannot be blank."));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Profile --

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
}

const PROFILE_OPTIONAL: [&str; 4] = ["image_url", "header_image_url", "bio", "location"];

/// Profile changes after blank optional fields have been normalized away.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

fn non_blank(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

impl ProfileForm {
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = object(value, "profile payload")?;
        Ok(Self {
            username: require_str(obj, "username")?,
            email: require_str(obj, "email")?,
            image_url: optional_str(obj, "image_url")?,
            header_image_url: optional_str(obj, "header_image_url")?,
            bio: optional_str(obj, "bio")?,
            location: optional_str(obj, "location")?,
            password: require_str(obj, "password")?,
        })
    }

    /// Submitted form fields; blank optional fields count as absent.
    pub fn from_form(fields: HashMap<String, String>) -> Result<Self> {
        Self::from_value(&form_value(fields, &PROFILE_OPTIONAL))
    }

    /// Splits the form into the requested changes and the current password.
    pub fn into_parts(self) -> (ProfileUpdate, String) {
        let update = ProfileUpdate {
            username: self.username,
            email: self.email,
            image_url: non_blank(self.image_url),
            header_image_url: non_blank(self.header_image_url),
            bio: non_blank(self.bio),
            location: non_blank(self.location),
        };
        (update, self.password)
    }
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)
    }
}

// -- Messages --

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub text: String,
    pub user_id: UserId,
}

impl NewMessage {
    pub fn new(text: impl Into<String>, user_id: UserId) -> Self {
        Self {
            text: text.into(),
            user_id,
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = object(value, "message payload")?;
        Ok(Self {
            text: require_str(obj, "text")?,
            user_id: require_id(obj, "user_id")?,
        })
    }

    /// Submitted form fields, authored by `user_id`.
    pub fn from_form(fields: HashMap<String, String>, user_id: UserId) -> Result<Self> {
        let mut payload = form_value(fields, &[]);
        if let Value::Object(obj) = &mut payload {
            obj.insert("user_id".to_string(), Value::from(user_id));
        }
        Self::from_value(&payload)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signup(username: Value, email: Value, password: Value, image: Value) -> Result<()> {
        let req = SignupRequest::from_value(&json!({
            "username": username,
            "email": email,
            "password": password,
            "image_url": image,
        }))?;
        req.validate()
    }

    #[test]
    fn signup_field_types() {
        let cases = [
            signup(json!([]), json!("test@test.com"), json!("password"), json!("imageurl")),
            signup(json!("username"), json!(true), json!("password"), json!("imageurl")),
            signup(json!("username"), json!("test@test.com"), json!(7), json!("imageurl")),
            signup(json!("username"), json!("test@test.com"), json!("password"), json!({})),
        ];
        for result in cases {
            assert!(matches!(result, Err(WarblerError::Type(_))), "{result:?}");
        }
    }

    #[test]
    fn signup_missing_field_is_type_error() {
        let result = SignupRequest::from_value(&json!({ "username": "username" }));
        assert!(matches!(result, Err(WarblerError::Type(_))));
    }

    #[test]
    fn signup_required_fields() {
        let cases = [
            signup(json!(""), json!("test@test.com"), json!("password"), json!("imageurl")),
            signup(json!("username"), json!(""), json!("password"), json!("imageurl")),
            signup(json!("username"), json!("test@test.com"), json!(""), json!("imageurl")),
            signup(json!("username"), json!("test@test.com"), json!("password"), json!("")),
        ];
        for result in cases {
            assert!(matches!(result, Err(WarblerError::Value(_))), "{result:?}");
        }
    }

    #[test]
    fn signup_min_lengths() {
        let short_name = signup(json!("u"), json!("test@test.com"), json!("password"), json!(null));
        assert!(matches!(short_name, Err(WarblerError::Value(_))));

        let short_pw = signup(json!("username"), json!("test@test.com"), json!("pw"), json!(null));
        assert!(matches!(short_pw, Err(WarblerError::Value(_))));

        let long_name = "x".repeat(USERNAME_MAX_LEN + 1);
        let result = signup(json!(long_name), json!("test@test.com"), json!("password"), json!(null));
        assert!(matches!(result, Err(WarblerError::Value(_))));
    }

    #[test]
    fn signup_accepts_null_image() {
        assert!(signup(json!("test"), json!("a@b.com"), json!("password"), json!(null)).is_ok());
    }

    #[test]
    fn message_payload_types() {
        assert!(matches!(
            NewMessage::from_value(&json!({ "text": "test text" })),
            Err(WarblerError::Type(_))
        ));
        assert!(matches!(
            NewMessage::from_value(&json!({ "text": null, "user_id": 1 })),
            Err(WarblerError::Type(_))
        ));
        assert!(matches!(
            NewMessage::from_value(&json!({ "text": 3, "user_id": true })),
            Err(WarblerError::Type(_))
        ));
        assert!(matches!(
            NewMessage::from_value(&json!({ "text": "hi", "user_id": 1.5 })),
            Err(WarblerError::Type(_))
        ));

        let msg = NewMessage::from_value(&json!({ "text": "hi", "user_id": 4 })).unwrap();
        assert_eq!(msg, NewMessage::new("hi", 4));
    }

    #[test]
    fn message_text_bounds() {
        assert!(validate_message_text("a").is_ok());
        assert!(validate_message_text(&"a".repeat(MESSAGE_MAX_LEN)).is_ok());
        assert!(matches!(
            validate_message_text(&"a".repeat(MESSAGE_MAX_LEN + 1)),
            Err(WarblerError::Value(_))
        ));
        assert!(matches!(validate_message_text(""), Err(WarblerError::Value(_))));
        // multi-byte characters count once
        assert!(validate_message_text(&"é".repeat(MESSAGE_MAX_LEN)).is_ok());
    }

    #[test]
    fn form_value_nulls_blank_optionals() {
        let fields = HashMap::from([
            ("username".to_string(), "bob".to_string()),
            ("image_url".to_string(), "  ".to_string()),
        ]);
        let value = form_value(fields, &["image_url"]);
        assert_eq!(value["username"], json!("bob"));
        assert_eq!(value["image_url"], Value::Null);
    }

    #[test]
    fn profile_form_drops_blank_fields() {
        let form = ProfileForm {
            username: "testtest".into(),
            email: "testuser@test.com".into(),
            image_url: Some(String::new()),
            header_image_url: None,
            bio: Some("this is a test".into()),
            location: Some(" ".into()),
            password: "testuser".into(),
        };
        let (update, password) = form.into_parts();
        assert_eq!(password, "testuser");
        assert_eq!(update.image_url, None);
        assert_eq!(update.location, None);
        assert_eq!(update.bio.as_deref(), Some("this is a test"));
        assert!(update.validate().is_ok());
    }
    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn profile_form_missing_password_is_type_error() {
        let result = ProfileForm::from_form(fields(&[
            ("username", "testtest"),
            ("email", "testuser@test.com"),
        ]));
        assert!(matches!(result, Err(WarblerError::Type(msg)) if msg.contains("password")));
    }

    #[test]
    fn profile_form_from_fields() {
        let form = ProfileForm::from_form(fields(&[
            ("username", "testtest"),
            ("email", "testuser@test.com"),
            ("bio", "this is a test"),
            ("location", ""),
            ("password", "testuser"),
        ]))
        .unwrap();
        assert_eq!(form.bio.as_deref(), Some("this is a test"));
        assert_eq!(form.location, None);
        assert_eq!(form.image_url, None);
    }

    #[test]
    fn message_form_needs_text_field() {
        let result = NewMessage::from_form(HashMap::new(), 1);
        assert!(matches!(result, Err(WarblerError::Type(msg)) if msg.contains("text")));

        let msg = NewMessage::from_form(fields(&[("text", "Hello")]), 3).unwrap();
        assert_eq!(msg, NewMessage::new("Hello", 3));
    }
}
