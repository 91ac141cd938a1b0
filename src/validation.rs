use std::{fmt, path::Path};
use thiserror::Error;

pub const FIELD_NAME: &str = "image";
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
pub const STRICT_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimePolicy {
    ImagePrefix,
    Strict,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing file: no image provided under field \"image\"")]
    MissingFile,
    #[error("invalid file: {0}")]
    InvalidFile(Rejection),
    #[error("too many files: only one image can be uploaded per request")]
    TooManyFiles,
    #[error("unexpected field \"{0}\": images must be sent under field \"image\"")]
    UnexpectedField(String),
    #[error("malformed multipart body: {0}")]
    Malformed(String),
}

impl From<Rejection> for ValidationError {
    fn from(rejection: Rejection) -> Self {
        ValidationError::InvalidFile(rejection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingExtension,
    Extension(String),
    MissingContentType,
    ContentType(String),
    TooLarge,
    Empty,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingExtension => write!(
                f,
                "file name has no extension (allowed: {})",
                ALLOWED_EXTENSIONS.join(", ")
            ),
            Rejection::Extension(ext) => write!(
                f,
                "extension \"{ext}\" is not allowed (allowed: {})",
                ALLOWED_EXTENSIONS.join(", ")
            ),
            Rejection::MissingContentType => write!(f, "content type is missing"),
            Rejection::ContentType(mime) => {
                write!(f, "content type \"{mime}\" is not an accepted image type")
            }
            Rejection::TooLarge => write!(
                f,
                "file exceeds the maximum size of {} MiB",
                MAX_FILE_SIZE / 1024 / 1024
            ),
            Rejection::Empty => write!(f, "file is empty"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRules {
    pub mime_policy: MimePolicy,
    pub max_file_size: usize,
}

impl UploadRules {
    pub fn new(mime_policy: MimePolicy) -> Self {
        Self {
            mime_policy,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    pub fn check_extension(&self, file_name: &str) -> Result<String, Rejection> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or(Rejection::MissingExtension)?;

        if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(Rejection::Extension(extension))
        }
    }

    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<(), Rejection> {
        let declared = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .ok_or(Rejection::MissingContentType)?;

        // "image/jpeg; charset=binary" -> "image/jpeg"
        let essence = declared
            .split(';')
            .next()
            .unwrap_or(declared)
            .trim()
            .to_ascii_lowercase();

        let accepted = match self.mime_policy {
            MimePolicy::ImagePrefix => {
                essence.starts_with("image/") && essence.len() > "image/".len()
            }
            MimePolicy::Strict => STRICT_MIME_TYPES.contains(&essence.as_str()),
        };

        if accepted {
            Ok(())
        } else {
            Err(Rejection::ContentType(declared.to_owned()))
        }
    }

    pub fn check_size(&self, size: usize) -> Result<(), Rejection> {
        if size > self.max_file_size {
            Err(Rejection::TooLarge)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions_in_any_case() {
        let rules = UploadRules::new(MimePolicy::ImagePrefix);

        for name in ["poster.jpg", "poster.JPEG", "still.Png", "banner.webp"] {
            assert!(rules.check_extension(name).is_ok(), "{name}");
        }
        assert_eq!(rules.check_extension("a.b.JPG").unwrap(), "jpg");
    }

    #[test]
    fn rejects_other_extensions() {
        let rules = UploadRules::new(MimePolicy::ImagePrefix);

        assert_eq!(
            rules.check_extension("anim.gif"),
            Err(Rejection::Extension("gif".to_owned()))
        );
        assert_eq!(
            rules.check_extension("poster"),
            Err(Rejection::MissingExtension)
        );
        assert_eq!(
            rules.check_extension("poster.png.exe"),
            Err(Rejection::Extension("exe".to_owned()))
        );
    }

    #[test]
    fn prefix_policy_accepts_any_image_type() {
        let rules = UploadRules::new(MimePolicy::ImagePrefix);

        assert!(rules.check_content_type(Some("image/gif")).is_ok());
        assert!(rules.check_content_type(Some("IMAGE/PNG")).is_ok());
        assert!(rules
            .check_content_type(Some("image/jpeg; charset=binary"))
            .is_ok());
        assert_eq!(
            rules.check_content_type(Some("application/pdf")),
            Err(Rejection::ContentType("application/pdf".to_owned()))
        );
        assert!(rules.check_content_type(Some("image/")).is_err());
        assert_eq!(
            rules.check_content_type(None),
            Err(Rejection::MissingContentType)
        );
    }

    #[test]
    fn strict_policy_only_accepts_listed_types() {
        let rules = UploadRules::new(MimePolicy::Strict);

        for mime in STRICT_MIME_TYPES {
            assert!(rules.check_content_type(Some(mime)).is_ok(), "{mime}");
        }
        assert!(rules.check_content_type(Some("image/gif")).is_err());
        assert!(rules.check_content_type(Some("image/svg+xml")).is_err());
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        let rules = UploadRules::new(MimePolicy::ImagePrefix);

        assert!(rules.check_size(MAX_FILE_SIZE).is_ok());
        assert_eq!(rules.check_size(MAX_FILE_SIZE + 1), Err(Rejection::TooLarge));
    }

    #[test]
    fn messages_name_the_reason() {
        let err = ValidationError::from(Rejection::Extension("gif".to_owned()));
        assert_eq!(
            err.to_string(),
            "invalid file: extension \"gif\" is not allowed (allowed: jpg, jpeg, png, webp)"
        );
        assert_eq!(
            ValidationError::from(Rejection::TooLarge).to_string(),
            "invalid file: file exceeds the maximum size of 5 MiB"
        );
        assert!(ValidationError::MissingFile
            .to_string()
            .starts_with("missing file"));
        assert!(ValidationError::TooManyFiles
            .to_string()
            .starts_with("too many files"));
    }
}
