use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};

use crate::error::StreamError;

/// Value sent for a checked checkbox, matching what browsers submit.
pub const CHECKED: &str = "on";

#[derive(Clone, Debug, PartialEq, Eq)]
enum FieldValue {
    Text(String),
    File { path: PathBuf, mime: Option<String> },
}

/// Ordered form fields as they stand at submit time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FieldValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields
            .push((name.to_string(), FieldValue::Text(value.into())));
        self
    }

    /// Adds a checkbox field; unchecked boxes are left out entirely.
    pub fn flag(self, name: &str, checked: bool) -> Self {
        if checked {
            self.text(name, CHECKED)
        } else {
            self
        }
    }

    pub fn file(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.fields.push((
            name.to_string(),
            FieldValue::File {
                path: path.into(),
                mime: None,
            },
        ));
        self
    }

    pub fn file_with_mime(mut self, name: &str, path: impl Into<PathBuf>, mime: &str) -> Self {
        self.fields.push((
            name.to_string(),
            FieldValue::File {
                path: path.into(),
                mime: Some(mime.to_string()),
            },
        ));
        self
    }

    /// Replaces every text field called `name`, or appends one if none exists.
    pub fn set_text(&mut self, name: &str, value: &str) {
        let mut found = false;
        for (field, current) in self.fields.iter_mut() {
            if field == name {
                if let FieldValue::Text(text) = current {
                    *text = value.to_string();
                    found = true;
                }
            }
        }
        if !found {
            self.fields
                .push((name.to_string(), FieldValue::Text(value.to_string())));
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(field, value)| match value {
            FieldValue::Text(text) if field == name => Some(text.as_str()),
            _ => None,
        })
    }

    /// Content type declared for the file field `name`, if any.
    pub fn file_mime(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(field, value)| match value {
            FieldValue::File { mime, .. } if field == name => mime.as_deref(),
            _ => None,
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Builds the multipart body, reading file fields from disk.
    pub async fn to_multipart(&self) -> Result<Form, StreamError> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = match value {
                FieldValue::Text(text) => form.text(name.clone(), text.clone()),
                FieldValue::File { path, mime } => {
                    form.part(name.clone(), file_part(path, mime.as_deref()).await?)
                }
            };
        }
        Ok(form)
    }
}

/// Writes `value` into `name` on every form, keeping a shared selection in sync.
pub fn mirror_text<'a>(forms: impl IntoIterator<Item = &'a mut FormData>, name: &str, value: &str) {
    for form in forms {
        form.set_text(name, value);
    }
}

async fn file_part(path: &Path, mime: Option<&str>) -> Result<Part, StreamError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| StreamError::Form {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string());
    let mut part = Part::bytes(bytes).file_name(file_name);
    if let Some(mime) = mime {
        part = part.mime_str(mime)?;
    }
    Ok(part)
}
