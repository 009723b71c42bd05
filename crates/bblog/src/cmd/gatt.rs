use bblog_schema::device::{
    decode_u32, encode_command, encode_u32, parse_passcode_status, parse_response,
    passcode_command, response_status, sensor_states, CommandOpcode, Gatt,
};
use bblog_schema::FieldRegistry;
use bblog_stream::diagnostics::hex;
use tracing::debug;

use crate::cmd::{
    CommandArgs, ConfigArgs, ConfigValue, GattAction, GattArgs, PasscodeArgs, ReadArgs,
    ResponseArgs,
};
use crate::exit::{schema_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{
    print_gatt, print_read, print_response, print_writes, GattOutput, OutputFormat, ReadOutput,
    ResponseOutput, WriteOutput,
};

pub fn run(args: GattArgs, format: OutputFormat) -> CliResult<i32> {
    match args.action {
        GattAction::Layout => layout(format),
        GattAction::Config(args) => config(args, format),
        GattAction::Read(args) => read(args, format),
        GattAction::Command(args) => command(args, format),
        GattAction::Passcode(args) => passcode(args, format),
        GattAction::Response(args) => response(args, format),
    }
}

fn layout(format: OutputFormat) -> CliResult<i32> {
    let entries: Vec<GattOutput> = Gatt::ALL
        .iter()
        .map(|gatt| GattOutput {
            name: gatt.name(),
            kind: if gatt.is_service() { "service" } else { "characteristic" },
            uuid: gatt.uuid(),
        })
        .collect();
    print_gatt(&entries, format);
    Ok(SUCCESS)
}

fn write_of(characteristic: Gatt, value: &[u8]) -> WriteOutput {
    WriteOutput {
        characteristic: characteristic.name(),
        uuid: characteristic.uuid(),
        value: hex(value),
    }
}

fn config(args: ConfigArgs, format: OutputFormat) -> CliResult<i32> {
    let values = [
        (Gatt::CfgLogEnable, args.logging.map(u32::from)),
        (Gatt::CfgInterval, args.interval),
        (Gatt::CfgSensorEnable, args.sensors),
        (Gatt::CfgRtImu, args.rt_imu),
    ];
    let writes: Vec<WriteOutput> = values
        .into_iter()
        .filter_map(|(gatt, value)| value.map(|v| write_of(gatt, &encode_u32(v))))
        .collect();
    if writes.is_empty() {
        return Err(CliError::new(USAGE, "config: nothing to write"));
    }
    debug!(writes = writes.len(), "config writes");
    print_writes(&writes, format);
    Ok(SUCCESS)
}

fn read(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let value = decode_u32(&args.value.0).map_err(|err| schema_error("read", err))?;
    let sensors = (args.characteristic == ConfigValue::SensorEnable)
        .then(|| sensor_states(&FieldRegistry::new(), value));
    let out = ReadOutput {
        characteristic: args.characteristic.characteristic().name(),
        value,
        sensors,
    };
    print_read(&out, format);
    Ok(SUCCESS)
}

fn opcode(value: u8) -> CliResult<CommandOpcode> {
    CommandOpcode::try_from(value).map_err(|err| CliError::new(USAGE, format!("opcode: {err}")))
}

fn command(args: CommandArgs, format: OutputFormat) -> CliResult<i32> {
    let opcode = opcode(args.opcode)?;
    let data = args.data.map(|d| d.0).unwrap_or_default();
    print_writes(&[write_of(Gatt::CmdTx, &encode_command(opcode, &data))], format);
    Ok(SUCCESS)
}

fn passcode(args: PasscodeArgs, format: OutputFormat) -> CliResult<i32> {
    let command = passcode_command(&args.passcode).map_err(|err| schema_error("passcode", err))?;
    print_writes(&[write_of(Gatt::CmdTx, &command)], format);
    Ok(SUCCESS)
}

fn response(args: ResponseArgs, format: OutputFormat) -> CliResult<i32> {
    let request = opcode(args.opcode)?;
    let bytes = args.response.0;

    let out = if request == CommandOpcode::GetPasscodeState {
        let status = parse_passcode_status(&bytes).map_err(|err| schema_error("response", err))?;
        ResponseOutput::passcode(args.opcode, hex(&bytes[1..]), status)
    } else {
        let data = parse_response(request, &bytes, bytes.len())
            .map_err(|err| schema_error("response", err))?;
        let status = if data.is_empty() {
            None
        } else {
            Some(response_status(&bytes).map_err(|err| schema_error("response", err))?)
        };
        ResponseOutput {
            opcode: args.opcode,
            data: hex(data),
            status,
            passcode: None,
            needs_unlock: None,
        }
    };
    print_response(&out, format);
    Ok(SUCCESS)
}
