use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum TcxError {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),
    #[error("Ill-formed XML: {0}")]
    IllFormed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("Namespace prefix '{0}' is not bound")]
    UnboundPrefix(String),
    #[error("Missing <{0}> in activity")]
    MissingStructure(&'static str),
    #[error("No {0} values to compute statistics over")]
    EmptySequence(&'static str),
    #[error("Non-numeric value '{value}' in <{element}>")]
    NotNumeric { element: String, value: String },
    #[error("Division by zero: {0} is 0")]
    DivisionByZero(&'static str),
    #[error("Pace of {0} s/km cannot be formatted")]
    PaceOutOfRange(f64),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TcxError {
    /// True for failures caused by absent data rather than a broken document.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::EmptySequence(_) | Self::DivisionByZero(_))
    }
}

pub type Result<T> = std::result::Result<T, TcxError>;

impl From<TcxError> for JsValue {
    fn from(e: TcxError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
