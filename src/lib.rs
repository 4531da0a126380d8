mod codec;
mod common;
mod error;
mod messages;
mod protocol;
mod templates;
mod validator;

pub use codec::{decode, decode_frame, encode, encode_frame};
pub use common::{
    ModbusDataType, ModbusTable, COIL_OFF, COIL_ON, MODBUS_PORT, PDU_OFFSET, PROTOCOL_ID,
};
pub use error::{ModbusError, ModbusResult};
pub use messages::{pack_coils, FunctionCode, ModbusMessage, ModbusPdu};
pub use protocol::{
    FieldSpec, FieldWidth, ProtocolBuilder, ProtocolDefinition, FUNCTION_CODE, LENGTH_FIELD,
    PROTOCOL_IDENTIFIER, TRANSACTION_IDENTIFIER, UNIT_IDENTIFIER,
};
pub use templates::{MessageTemplate, TemplateBuilder, TemplateRegistry, FC1_REQUEST_MSG};
pub use validator::{check_protocol_id, validate_pdu};
