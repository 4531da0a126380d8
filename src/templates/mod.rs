use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::codec;
use crate::common::ModbusDataType;
use crate::error::{ModbusError, ModbusResult};
use crate::messages::{FunctionCode, ModbusMessage, ModbusPdu};
use crate::protocol::{
    FieldSpec, FieldWidth, ProtocolDefinition, FUNCTION_CODE, LENGTH_FIELD, TRANSACTION_IDENTIFIER,
    UNIT_IDENTIFIER,
};
use crate::validator;

/// Name the canonical FC1 request template ships under
pub const FC1_REQUEST_MSG: &str = "Read Coils (FC1)";

/// A partially-filled message shape saved under a name
///
/// Payload fields either carry a concrete value fixed by the function's
/// semantics or stay placeholders resolved at instantiation time.
/// Instantiation reads, never mutates.
#[derive(Clone, PartialEq, Debug)]
pub struct MessageTemplate {
    name: String,
    protocol: ProtocolDefinition,
    function_code: FunctionCode,
    payload_fields: Vec<FieldSpec>,
    locked: bool,
}

impl MessageTemplate {
    /// The template a test author defines once for the canonical FC1
    /// request: starting address and quantity left as placeholders
    pub fn fc1_read_coils_request(protocol: &ProtocolDefinition) -> Self {
        TemplateBuilder::new_message(FC1_REQUEST_MSG, protocol, FunctionCode::ReadCoils)
            .u16_field("startingAddress", None)
            .u16_field("quantityOfCoils", None)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function_code(&self) -> FunctionCode {
        self.function_code
    }

    /// Merge dynamic values over the template and produce a resolved message
    ///
    /// Every placeholder must be supplied; a supplied value for a fixed
    /// field must match it. Field names the template does not know are
    /// ignored, the host keyword layer owns argument validation.
    pub fn instantiate(
        &self,
        dynamic_fields: &HashMap<String, u16>,
    ) -> ModbusResult<ModbusMessage> {
        let mut transaction_id = 0u16;
        let mut unit_id = 0u8;

        for field in self.protocol.header_fields() {
            match field.name.as_str() {
                // Derived from the pdu length at encode time
                LENGTH_FIELD => continue,
                FUNCTION_CODE => {
                    let spec = FieldSpec::u8(FUNCTION_CODE, Some(self.function_code as u16));
                    codec::resolve_field_value(&spec, dynamic_fields.get(FUNCTION_CODE).copied())?;
                }
                name => {
                    let supplied = dynamic_fields.get(name).copied();
                    let value = codec::resolve_field_value(field, supplied)?;

                    match name {
                        TRANSACTION_IDENTIFIER => transaction_id = value,
                        UNIT_IDENTIFIER => unit_id = value as u8,
                        _ => {}
                    }
                }
            }
        }

        let mut payload = Vec::new();
        for field in &self.payload_fields {
            let supplied = dynamic_fields.get(field.name.as_str()).copied();
            codec::encode_field(field, supplied, &mut payload)?;
        }

        let pdu = ModbusPdu::from_parts(self.function_code as u8, payload);
        validator::validate_pdu(&pdu)?;

        trace!(
            "instantiated template '{}': transaction={:#06X} unit={}",
            self.name,
            transaction_id,
            unit_id
        );

        Ok(ModbusMessage::new(transaction_id, unit_id, pdu))
    }
}

/// Step-by-step template construction
///
/// The field adders mirror the keyword surface a host test library exposes:
/// coils and registers append payload fields with their domain rules
/// applied to fixed values up front.
pub struct TemplateBuilder {
    name: String,
    protocol: ProtocolDefinition,
    function_code: FunctionCode,
    payload_fields: Vec<FieldSpec>,
}

impl TemplateBuilder {
    pub fn new_message(
        name: impl Into<String>,
        protocol: &ProtocolDefinition,
        function_code: FunctionCode,
    ) -> Self {
        TemplateBuilder {
            name: name.into(),
            protocol: protocol.clone(),
            function_code,
            payload_fields: Vec::new(),
        }
    }

    pub fn u16_field(mut self, name: impl Into<String>, fixed: Option<u16>) -> Self {
        self.payload_fields.push(FieldSpec::u16(name, fixed));
        self
    }

    pub fn u8_field(
        mut self,
        name: impl Into<String>,
        fixed: Option<u16>,
    ) -> ModbusResult<Self> {
        let name = name.into();
        if let Some(value) = fixed {
            if value > FieldWidth::U8.max_value() {
                return Err(ModbusError::FieldValueOutOfRange { field: name, value });
            }
        }
        self.payload_fields.push(FieldSpec::u8(name, fixed));
        Ok(self)
    }

    /// A single coil field; a fixed value must be one of the two sentinels
    pub fn coil(self, name: impl Into<String>, value: Option<u16>) -> ModbusResult<Self> {
        if let Some(raw) = value {
            ModbusDataType::coil_from_representation(raw)?;
        }
        Ok(self.u16_field(name, value))
    }

    /// One bitmap byte of up to 8 coil states
    pub fn coils(self, name: impl Into<String>, value: Option<u16>) -> ModbusResult<Self> {
        self.u8_field(name, value)
    }

    pub fn holding_register(
        self,
        name: impl Into<String>,
        value: Option<u32>,
    ) -> ModbusResult<Self> {
        let fixed = match value {
            Some(raw) => Some(ModbusDataType::register_from_raw(raw)?.get_representation()),
            None => None,
        };
        Ok(self.u16_field(name, fixed))
    }

    pub fn input_register(self, name: impl Into<String>) -> Self {
        self.u16_field(name, None)
    }

    pub fn discrete_input(self, name: impl Into<String>) -> Self {
        self.u16_field(name, None)
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate {
            name: self.name,
            protocol: self.protocol,
            function_code: self.function_code,
            payload_fields: self.payload_fields,
            locked: false,
        }
    }
}

/// Process-wide named template store
///
/// Lifecycle: empty on construction, populated by save calls, cleared only
/// by an explicit reset. A single lock guards define/instantiate/reset;
/// encoding and decoding of resolved messages touch no shared state.
pub struct TemplateRegistry {
    templates: Mutex<HashMap<String, MessageTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        TemplateRegistry {
            templates: Mutex::new(HashMap::new()),
        }
    }

    /// Save a template under its name
    ///
    /// Overwriting is permitted unless the stored entry was saved with
    /// `unlocked = false`.
    pub fn save_template(&self, template: MessageTemplate, unlocked: bool) -> ModbusResult<()> {
        let mut templates = self.templates.lock().expect("lock poisoned");

        if let Some(existing) = templates.get(template.name()) {
            if existing.locked {
                return Err(ModbusError::TemplateLocked {
                    name: template.name().to_string(),
                });
            }
        }

        debug!(
            "template '{}' saved ({})",
            template.name(),
            if unlocked { "unlocked" } else { "locked" }
        );

        let mut template = template;
        template.locked = !unlocked;
        templates.insert(template.name.clone(), template);

        Ok(())
    }

    pub fn instantiate(
        &self,
        name: &str,
        dynamic_fields: &HashMap<String, u16>,
    ) -> ModbusResult<ModbusMessage> {
        let templates = self.templates.lock().expect("lock poisoned");

        let template = templates
            .get(name)
            .ok_or_else(|| ModbusError::TemplateNotFound {
                name: name.to_string(),
            })?;

        template.instantiate(dynamic_fields)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .lock()
            .expect("lock poisoned")
            .contains_key(name)
    }

    /// Drop every template, locked or not
    pub fn reset(&self) {
        self.templates.lock().expect("lock poisoned").clear();
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
