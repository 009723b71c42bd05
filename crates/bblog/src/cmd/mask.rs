use bblog_schema::device::{sensor_states, MaskChange};
use bblog_schema::FieldRegistry;
use tracing::debug;

use crate::cmd::MaskArgs;
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_mask, MaskOutput, OutputFormat};

pub fn run(args: MaskArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = FieldRegistry::new();
    let mut change = MaskChange::new();
    for name in &args.disable {
        change
            .switch(&registry, name, false)
            .map_err(|err| schema_error("disable", err))?;
    }
    for name in &args.enable {
        change
            .switch(&registry, name, true)
            .map_err(|err| schema_error("enable", err))?;
    }

    let mask = change.apply(args.current);
    debug!(previous = args.current, mask, "sensor mask");
    let out = MaskOutput {
        previous: args.current,
        mask,
        sensors: sensor_states(&registry, mask),
    };
    print_mask(&out, format);
    Ok(SUCCESS)
}
