use bblog_schema::FieldRegistry;

use crate::cmd::FieldsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_fields, FieldOutput, OutputFormat};

pub fn run(args: FieldsArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = FieldRegistry::new();
    let fields: Vec<FieldOutput<'_>> = if args.sensors {
        registry.sensors().map(FieldOutput::from).collect()
    } else {
        registry.fields().map(FieldOutput::from).collect()
    };
    print_fields(&fields, format);
    Ok(SUCCESS)
}
