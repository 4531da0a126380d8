use thiserror::Error;

/// Result type for all protocol engine operations
pub type ModbusResult<T> = std::result::Result<T, ModbusError>;

/// Protocol engine errors
///
/// Every failure is reported to the caller as one of these variants; none
/// is retried internally and no partial frame is ever produced alongside
/// one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModbusError {
    /// Fewer bytes available than the decoder needs
    #[error("truncated frame: needed {expected} byte(s), {actual} left")]
    TruncatedFrame { expected: usize, actual: usize },

    /// The protocol identifier field is not the Modbus TCP/IP constant
    #[error("protocol identifier mismatch: expected 1, got {got}")]
    ProtocolIdMismatch { got: u16 },

    /// The length field disagrees with the actual frame size
    #[error("length field mismatch: declared {declared}, frame carries {actual}")]
    LengthMismatch { declared: u16, actual: usize },

    /// A caller-supplied value differs from the field's fixed value
    #[error("value mismatch for field '{field}': fixed value is {expected}, got {got}")]
    FieldValueMismatch { field: String, expected: u16, got: u16 },

    /// A value does not fit the field's declared width
    #[error("value {value} does not fit field '{field}'")]
    FieldValueOutOfRange { field: String, value: u16 },

    /// A single coil value outside {0xFF00, 0x0000}
    #[error("invalid single coil value {value:#06X}, only 0xFF00 and 0x0000 are valid")]
    InvalidCoilValue { value: u16 },

    /// A register value outside 0..=65535
    #[error("register value {value} out of range 0..=65535")]
    RegisterValueOutOfRange { value: u32 },

    /// Instantiating a template name that was never defined
    #[error("no template named '{name}'")]
    TemplateNotFound { name: String },

    /// Overwriting a template that was saved locked
    #[error("template '{name}' is locked and cannot be overwritten")]
    TemplateLocked { name: String },

    /// A placeholder field left without a value at instantiation
    #[error("no value supplied for field '{field}'")]
    MissingField { field: String },

    /// A PDU payload whose shape does not match its function code
    #[error("payload shape mismatch for function code {function_code:#04X}: expected {expected} byte(s), got {actual}")]
    PayloadShapeMismatch {
        function_code: u8,
        expected: usize,
        actual: usize,
    },

    /// A protocol schema violating the MBAP field layout invariants
    #[error("invalid protocol definition: {0}")]
    ProtocolDefinition(String),
}
