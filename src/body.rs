use reqwest::{
    header::{self, HeaderMap},
    multipart, Method,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{NetworkError, Result};

/// Request payload accepted by the verb methods.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Serialized to JSON text before sending.
    Json(JsonValue),
    /// Sent verbatim.
    Text(String),
    /// Multipart form, sent with a transport-generated boundary.
    Form(FormData),
}

impl RequestBody {
    /// Serializes any `Serialize` value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|err| NetworkError::configuration(format!("body is not serializable: {err}")))
    }
}

impl From<()> for RequestBody {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<JsonValue> for RequestBody {
    fn from(value: JsonValue) -> Self {
        Self::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<FormData> for RequestBody {
    fn from(value: FormData) -> Self {
        Self::Form(value)
    }
}

/// Replayable multipart form payload.
///
/// Converted into a fresh `reqwest` form on every attempt so retries can
/// resend it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormPart)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormPart {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: Option<String>,
        mime: Option<String>,
    },
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Appends a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormPart::File {
                bytes: bytes.into(),
                file_name: Some(file_name.into()),
                mime: None,
            },
        ));
        self
    }

    /// Appends a file field with an explicit content type.
    pub fn file_with_mime(
        mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormPart::File {
                bytes: bytes.into(),
                file_name: Some(file_name.into()),
                mime: Some(mime.into()),
            },
        ));
        self
    }

    pub fn fields(&self) -> &[(String, FormPart)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn to_multipart(&self) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();
        for (name, part) in &self.fields {
            form = match part {
                FormPart::Text(value) => form.text(name.clone(), value.clone()),
                FormPart::File {
                    bytes,
                    file_name,
                    mime,
                } => {
                    let mut file = multipart::Part::bytes(bytes.clone());
                    if let Some(file_name) = file_name {
                        file = file.file_name(file_name.clone());
                    }
                    if let Some(mime) = mime {
                        file = file.mime_str(mime).map_err(|err| {
                            NetworkError::configuration(format!(
                                "invalid content type for form field '{name}': {err}"
                            ))
                        })?;
                    }
                    form.part(name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

/// Body as it leaves the client, after encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum OutgoingBody {
    Text(String),
    Form(FormData),
}

/// Applies the body encoding policy.
///
/// GET and HEAD never carry a body. Forms pass through and drop
/// `Content-Type` from `headers`; strings are verbatim; JSON is serialized.
pub(crate) fn encode_body(
    method: &Method,
    body: RequestBody,
    headers: &mut HeaderMap,
) -> Result<Option<OutgoingBody>> {
    if *method == Method::GET || *method == Method::HEAD {
        return Ok(None);
    }

    match body {
        RequestBody::Empty => Ok(None),
        RequestBody::Form(form) => {
            headers.remove(header::CONTENT_TYPE);
            Ok(Some(OutgoingBody::Form(form)))
        }
        RequestBody::Text(text) => Ok(Some(OutgoingBody::Text(text))),
        RequestBody::Json(value) => serde_json::to_string(&value)
            .map(|text| Some(OutgoingBody::Text(text)))
            .map_err(|err| NetworkError::configuration(format!("body is not serializable: {err}"))),
    }
}
