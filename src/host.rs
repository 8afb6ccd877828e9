//! Host adapter and invoke glue
//!
//! The hosting voice-automation application drives the link through named
//! session variables and a context string per invocation. [`HostAdapter`] is
//! the narrow typed surface the glue needs from the host; [`invoke`] maps a
//! context string onto one dispatcher call, reading parameters from and
//! writing results back through the adapter.
//!
//! Invocation failures are reported to the host as a `false` return plus a
//! structured log record; only the logging side effect distinguishes an
//! unexpected dispatch error from an ordinary failed lookup.

use crate::dataref::{DataRef, DataRefType, DataRefValue};
use crate::link::Link;
use crate::transport::Transport;
use crate::{LinkError, Result};
use tracing::{error, info, warn};

/// Host variable carrying the dataref name for get/set invocations.
pub const VAR_DATAREF_NAME: &str = "~datarefName";
/// Host variable naming where a get result should be stored.
pub const VAR_TARGET_VAR: &str = "~targetVar";
/// Host variable carrying the dataref value, both directions.
pub const VAR_DATAREF_VALUE: &str = "~~datarefValue";
/// Host variable carrying the wire type discriminant for set invocations.
pub const VAR_DATAREF_TYPE: &str = "~datarefType";
/// Host variable carrying `;`-separated command names.
pub const VAR_COMMAND_NAME: &str = "~commandName";
/// Host variable carrying the hold duration in milliseconds.
pub const VAR_COMMAND_DURATION: &str = "~commandDuration";

/// Typed getter/setter surface toward the hosting application.
///
/// This replaces free-form property access into the host with exactly the
/// operations the glue needs. Getters return `None` when the variable does
/// not exist in the host session.
pub trait HostAdapter {
    fn get_text(&self, name: &str) -> Option<String>;
    fn get_int(&self, name: &str) -> Option<i32>;
    fn get_decimal(&self, name: &str) -> Option<f64>;
    fn set_text(&mut self, name: &str, value: &str);
    fn set_int(&mut self, name: &str, value: i32);
    fn set_decimal(&mut self, name: &str, value: f64);
}

/// Operations the host may request by context string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeContext {
    GetDataref,
    SetDataref,
    BeginCommand,
    EndCommand,
    OnceCommand,
    HoldCommand,
}

impl InvokeContext {
    pub fn parse(context: &str) -> Option<Self> {
        match context {
            "GetDataref" => Some(Self::GetDataref),
            "SetDataref" => Some(Self::SetDataref),
            "BeginCommand" => Some(Self::BeginCommand),
            "EndCommand" => Some(Self::EndCommand),
            "OnceCommand" => Some(Self::OnceCommand),
            "HoldCommand" => Some(Self::HoldCommand),
            _ => None,
        }
    }
}

/// Execute one host invocation against the link.
///
/// Returns whether the operation succeeded. Never panics into the host:
/// unknown contexts and dispatch errors are logged and reported as `false`.
pub async fn invoke<T, H>(link: &mut Link<T>, host: &mut H, context: &str) -> bool
where
    T: Transport,
    H: HostAdapter,
{
    let Some(parsed) = InvokeContext::parse(context) else {
        warn!(context, "unknown invoke context");
        return false;
    };

    match dispatch(link, host, parsed).await {
        Ok(ok) => ok,
        Err(e) => {
            error!(context, error = %e, "invocation failed");
            false
        }
    }
}

async fn dispatch<T, H>(link: &mut Link<T>, host: &mut H, context: InvokeContext) -> Result<bool>
where
    T: Transport,
    H: HostAdapter,
{
    match context {
        InvokeContext::GetDataref => get_dataref(link, host).await,
        InvokeContext::SetDataref => set_dataref(link, host).await,
        InvokeContext::BeginCommand => {
            let commands = required_text(host, VAR_COMMAND_NAME)?;
            let ok = link.begin_command(&commands).await?;
            if !ok {
                warn!(commands = %commands, "failed to begin command");
            }
            Ok(ok)
        }
        InvokeContext::EndCommand => {
            let commands = required_text(host, VAR_COMMAND_NAME)?;
            let ok = link.end_command(&commands).await?;
            if !ok {
                warn!(commands = %commands, "failed to end command");
            }
            Ok(ok)
        }
        InvokeContext::OnceCommand => {
            let commands = required_text(host, VAR_COMMAND_NAME)?;
            let ok = link.once_command(&commands).await?;
            if !ok {
                warn!(commands = %commands, "failed to fire command");
            }
            Ok(ok)
        }
        InvokeContext::HoldCommand => {
            let commands = required_text(host, VAR_COMMAND_NAME)?;
            let duration = host.get_int(VAR_COMMAND_DURATION).ok_or_else(|| {
                LinkError::Host("holding a command requires a duration".to_string())
            })?;
            let duration_ms = u32::try_from(duration).map_err(|_| {
                LinkError::Host(format!("invalid hold duration: {} ms", duration))
            })?;
            let ok = link.hold_command(&commands, duration_ms).await?;
            if !ok {
                warn!(commands = %commands, duration_ms, "failed to hold command");
            }
            Ok(ok)
        }
    }
}

async fn get_dataref<T, H>(link: &mut Link<T>, host: &mut H) -> Result<bool>
where
    T: Transport,
    H: HostAdapter,
{
    let name = required_text(host, VAR_DATAREF_NAME)?;
    let target = host
        .get_text(VAR_TARGET_VAR)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| VAR_DATAREF_VALUE.to_string());

    let Some(dataref) = link.get_dataref(&name).await? else {
        warn!(dataref = %name, "failed to get dataref");
        return Ok(false);
    };

    info!(dataref = %name, value = %dataref.value(), "got dataref");
    match dataref.value() {
        DataRefValue::Int(v) => host.set_int(&target, *v),
        DataRefValue::Float(v) => host.set_decimal(&target, f64::from(*v)),
        DataRefValue::Double(v) => host.set_decimal(&target, *v),
        DataRefValue::Data(s) => host.set_text(&target, s),
        DataRefValue::FloatArray(_) | DataRefValue::IntArray(_) => {
            return Err(LinkError::Host(
                "array datarefs are not supported by the host binding".to_string(),
            ));
        }
    }
    Ok(true)
}

async fn set_dataref<T, H>(link: &mut Link<T>, host: &mut H) -> Result<bool>
where
    T: Transport,
    H: HostAdapter,
{
    let name = required_text(host, VAR_DATAREF_NAME)?;
    let type_id = host
        .get_int(VAR_DATAREF_TYPE)
        .ok_or_else(|| LinkError::Host(format!("missing parameter {}", VAR_DATAREF_TYPE)))?;
    let data_type = DataRefType::try_from(type_id)
        .map_err(|_| LinkError::Host(format!("unsupported dataref type: {}", type_id)))?;

    let value = match data_type {
        DataRefType::Int => DataRefValue::Int(required_int(host, VAR_DATAREF_VALUE)?),
        DataRefType::Float => DataRefValue::Float(required_decimal(host, VAR_DATAREF_VALUE)? as f32),
        DataRefType::Double => DataRefValue::Double(required_decimal(host, VAR_DATAREF_VALUE)?),
        DataRefType::Data => DataRefValue::Data(required_text(host, VAR_DATAREF_VALUE)?),
        DataRefType::FloatArray | DataRefType::IntArray => {
            return Err(LinkError::Host(
                "array datarefs are not supported by the host binding".to_string(),
            ));
        }
    };

    let dataref = DataRef::new(name, value);
    let ok = link.set_dataref(&dataref).await?;
    if ok {
        info!(dataref = dataref.name(), "successfully set dataref");
    } else {
        warn!(dataref = dataref.name(), "failed to set dataref");
    }
    Ok(ok)
}

fn required_text<H: HostAdapter>(host: &H, name: &str) -> Result<String> {
    host.get_text(name)
        .ok_or_else(|| LinkError::Host(format!("missing parameter {}", name)))
}

fn required_int<H: HostAdapter>(host: &H, name: &str) -> Result<i32> {
    host.get_int(name)
        .ok_or_else(|| LinkError::Host(format!("no int value assigned to {}", name)))
}

fn required_decimal<H: HostAdapter>(host: &H, name: &str) -> Result<f64> {
    host.get_decimal(name)
        .ok_or_else(|| LinkError::Host(format!("no decimal value assigned to {}", name)))
}
