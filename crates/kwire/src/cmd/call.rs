use std::str::FromStr;

use kwire_frame::{Elements, Value};
use kwire_schema::{ArgSpec, ScalarKind, TypeSpec};
use serde::Serialize;

use crate::cmd::CallArgs;
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_json, print_table, value_to_json, OutputFormat};

#[derive(Serialize)]
struct CallOutput<'a> {
    device: &'a str,
    command: &'a str,
    ret_type: &'a str,
    value: serde_json::Value,
}

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = args.server.connect()?;

    let command = client
        .schema()
        .resolve(&args.device, &args.command)
        .map_err(|err| client_error("call failed", err.into()))?
        .command
        .clone();
    if command.arity() != args.args.len() {
        return Err(CliError::new(
            USAGE,
            format!(
                "{}::{} takes {} arguments but {} were given",
                args.device,
                args.command,
                command.arity(),
                args.args.len()
            ),
        ));
    }

    let values = command
        .args
        .iter()
        .zip(&args.args)
        .map(|(spec, text)| parse_arg(spec, text))
        .collect::<CliResult<Vec<_>>>()?;

    client
        .call(&args.device, &args.command, &values)
        .map_err(|err| client_error("call failed", err))?;

    let value = match command.ret {
        Some(_) => Some(
            client
                .read_value()
                .map_err(|err| client_error("reading reply failed", err))?,
        ),
        None => None,
    };

    let out = CallOutput {
        device: &args.device,
        command: &args.command,
        ret_type: command.ret_type_name(),
        value: value.as_ref().map_or(serde_json::Value::Null, value_to_json),
    };
    print_reply(&out, value.as_ref(), format);
    Ok(SUCCESS)
}

fn print_reply(out: &CallOutput<'_>, value: Option<&Value>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => print_table(
            &["DEVICE", "COMMAND", "RETURNS", "VALUE"],
            vec![vec![
                out.device.to_string(),
                out.command.to_string(),
                out.ret_type.to_string(),
                out.value.to_string(),
            ]],
        ),
        OutputFormat::Pretty => {
            println!("{}::{} -> {}", out.device, out.command, out.value);
        }
        OutputFormat::Raw => match value {
            Some(Value::Str(text)) => println!("{text}"),
            Some(_) => println!("{}", out.value),
            None => {}
        },
    }
}

/// Parse one command-line argument according to its declared type.
fn parse_arg(arg: &ArgSpec, text: &str) -> CliResult<Value> {
    let invalid = || {
        CliError::new(
            USAGE,
            format!("invalid value '{text}' for argument of type {}", arg.type_name),
        )
    };

    match &arg.spec {
        TypeSpec::Scalar(kind) => parse_scalar(*kind, text).ok_or_else(invalid),
        TypeSpec::Array { elem, .. } | TypeSpec::Vector(elem) => {
            parse_elements(*elem, text).map(Value::Buffer).ok_or_else(invalid)
        }
        TypeSpec::Tuple(_) => Err(CliError::new(
            USAGE,
            format!("tuple arguments ({}) cannot be given on the command line", arg.type_name),
        )),
    }
}

fn parse_scalar(kind: ScalarKind, raw: &str) -> Option<Value> {
    let text = raw.trim();
    let value = match kind {
        ScalarKind::U8 => Value::U8(parse_int(text)?),
        ScalarKind::I8 => Value::I8(parse_int(text)?),
        ScalarKind::U16 => Value::U16(parse_int(text)?),
        ScalarKind::I16 => Value::I16(parse_int(text)?),
        ScalarKind::U32 => Value::U32(parse_int(text)?),
        ScalarKind::I32 => Value::I32(parse_int(text)?),
        ScalarKind::U64 => Value::U64(parse_int(text)?),
        ScalarKind::I64 => Value::I64(parse_int(text)?),
        ScalarKind::F32 => Value::F32(text.parse().ok()?),
        ScalarKind::F64 => Value::F64(text.parse().ok()?),
        ScalarKind::Bool => match text {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return None,
        },
        ScalarKind::String => Value::Str(raw.to_string()),
    };
    Some(value)
}

/// Decimal or `0x`-prefixed hexadecimal integer.
fn parse_int<T>(text: &str) -> Option<T>
where
    T: FromStr + TryFrom<u64>,
{
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)
            .ok()
            .and_then(|v| T::try_from(v).ok()),
        None => text.parse().ok(),
    }
}

fn parse_elements(elem: ScalarKind, text: &str) -> Option<Elements> {
    fn collect<T>(text: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
        if text.trim().is_empty() {
            return Some(Vec::new());
        }
        text.split(',').map(|item| parse(item.trim())).collect()
    }

    let elements = match elem {
        ScalarKind::U8 => Elements::U8(collect(text, parse_int)?),
        ScalarKind::I8 => Elements::I8(collect(text, parse_int)?),
        ScalarKind::U16 => Elements::U16(collect(text, parse_int)?),
        ScalarKind::I16 => Elements::I16(collect(text, parse_int)?),
        ScalarKind::U32 => Elements::U32(collect(text, parse_int)?),
        ScalarKind::I32 => Elements::I32(collect(text, parse_int)?),
        ScalarKind::U64 => Elements::U64(collect(text, parse_int)?),
        ScalarKind::I64 => Elements::I64(collect(text, parse_int)?),
        ScalarKind::F32 => Elements::F32(collect(text, |s| s.parse().ok())?),
        ScalarKind::F64 => Elements::F64(collect(text, |s| s.parse().ok())?),
        ScalarKind::Bool | ScalarKind::String => return None,
    };
    Some(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(type_name: &str) -> ArgSpec {
        ArgSpec {
            name: None,
            type_name: type_name.to_string(),
            spec: TypeSpec::parse(type_name).unwrap(),
        }
    }

    #[test]
    fn parses_scalars_by_declared_kind() {
        assert_eq!(parse_arg(&arg("uint32_t"), "42").unwrap(), Value::U32(42));
        assert_eq!(parse_arg(&arg("uint16_t"), "0xBEEF").unwrap(), Value::U16(0xBEEF));
        assert_eq!(parse_arg(&arg("int"), "-7").unwrap(), Value::I32(-7));
        assert_eq!(parse_arg(&arg("double"), "0.25").unwrap(), Value::F64(0.25));
        assert_eq!(parse_arg(&arg("bool"), "true").unwrap(), Value::Bool(true));
        assert_eq!(
            parse_arg(&arg("const std::string&"), "hello").unwrap(),
            Value::Str("hello".to_string())
        );
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert_eq!(parse_arg(&arg("uint8_t"), "256").unwrap_err().code, USAGE);
        assert_eq!(parse_arg(&arg("uint8_t"), "0x100").unwrap_err().code, USAGE);
        assert_eq!(parse_arg(&arg("float"), "fast").unwrap_err().code, USAGE);
        assert_eq!(parse_arg(&arg("bool"), "yes").unwrap_err().code, USAGE);
    }

    #[test]
    fn parses_comma_separated_buffers() {
        assert_eq!(
            parse_arg(&arg("std::vector<uint32_t>"), "1, 2,0x10").unwrap(),
            Value::from(vec![1u32, 2, 16])
        );
        assert_eq!(
            parse_arg(&arg("std::array<float, 2>"), "0.5,1").unwrap(),
            Value::from(vec![0.5f32, 1.0])
        );
        assert_eq!(
            parse_arg(&arg("std::vector<int16_t>"), "").unwrap(),
            Value::from(Vec::<i16>::new())
        );
    }

    #[test]
    fn tuple_arguments_are_refused() {
        let err = parse_arg(&arg("std::tuple<int, float>"), "1,2").unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
