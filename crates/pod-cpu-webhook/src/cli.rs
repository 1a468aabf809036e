use clap::builder::PossibleValue;
use clap::{Arg, ArgAction, Command, crate_authors, crate_description, crate_name, crate_version};

pub const DEFAULT_CERT_FILE: &str = "/etc/webhook/certs/tls.crt";
pub const DEFAULT_KEY_FILE: &str = "/etc/webhook/certs/tls.key";
pub const DEFAULT_PORT: &str = "443";

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("WEBHOOK_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value(DEFAULT_PORT)
            .env("PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value(DEFAULT_CERT_FILE)
            .env("TLS_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS. Leave empty, together with --key-file, to serve plain HTTP"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value(DEFAULT_KEY_FILE)
            .env("TLS_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS. Leave empty, together with --cert-file, to serve plain HTTP"),
        Arg::new("cpu-request")
            .long("cpu-request")
            .value_name("QUANTITY")
            .default_value(crate::mutation::DEFAULT_CPU_REQUEST)
            .env("WEBHOOK_CPU_REQUEST")
            .help("CPU request given to containers that do not declare one"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    let subcommands = vec![Command::new("docs")
        .about("Generates the markdown documentation for the command line interface")];

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
        .subcommands(subcommands)
}
