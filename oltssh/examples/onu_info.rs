//! Connect to an OLT, print its capability matrix and run a read-only query.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example onu_info -- --host 10.10.0.2 --user admin --password admin123 \
//!     --vendor huawei --model MA5800-X17 --command "display ont info 0/1/1 all"
//! ```
//!
//! Pass `--enable` for vendors whose show commands need the privileged
//! mode (V-SOL, C-Data).

use std::env;
use std::time::Duration;

use oltssh::{DriverFactory, Operation, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let Some(password) = &args.password else {
        eprintln!("Error: --password is required");
        std::process::exit(1);
    };

    let mut builder = SessionConfig::builder(&args.host)
        .port(args.port)
        .username(&args.user)
        .secret(password)
        .vendor(&args.vendor)
        .timeout(Duration::from_secs(args.timeout));
    if let Some(enable) = &args.enable_secret {
        builder = builder.enable_secret(enable);
    }
    let config = builder.build()?;

    let factory = DriverFactory::global();
    let driver = factory.create_driver(config, &args.model)?;

    let caps = driver.capabilities();
    println!("{} {} supports:", caps.vendor, caps.model);
    for op in caps.supported_operations() {
        println!("  {op}");
    }
    println!(
        "PON ports: {}, max ONUs/port: {}, port naming: {:?}",
        caps.pon_ports, caps.max_onus_per_port, caps.port_naming
    );

    if let Err(e) = driver.require(Operation::OnuInfo) {
        eprintln!("{e}");
        return Ok(());
    }

    println!("\nConnecting to {}:{}...", args.host, args.port);
    driver.connect().await?;

    if args.enable {
        driver.escalate().await?;
    }

    println!("Executing: {}", args.command);
    println!("{}", "-".repeat(50));
    match driver.execute(&args.command).await {
        Ok(response) => {
            println!("{}", response.result);
            println!("{}", "-".repeat(50));
            println!("Completed in {:?}", response.elapsed);
        }
        Err(e) => {
            eprintln!("Command failed ({:?}): {}", e.kind(), e);
            if let Some(partial) = e.partial_output() {
                eprintln!("Output so far:\n{partial}");
            }
        }
    }

    println!("Session alive: {}", driver.is_alive().await);
    driver.close().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    enable_secret: Option<String>,
    vendor: String,
    model: String,
    command: String,
    enable: bool,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let mut args = Args {
            host: "localhost".to_string(),
            port: 22,
            user: "admin".to_string(),
            password: None,
            enable_secret: None,
            vendor: "huawei".to_string(),
            model: String::new(),
            command: "display board 0".to_string(),
            enable: false,
            timeout: 30,
        };

        let mut iter = env::args().skip(1);
        while let Some(flag) = iter.next() {
            match flag.as_str() {
                "--enable" => args.enable = true,
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    let Some(value) = iter.next() else {
                        eprintln!("Missing value for {flag}");
                        std::process::exit(1);
                    };
                    match flag.as_str() {
                        "--host" | "-h" => args.host = value,
                        "--port" | "-p" => args.port = value.parse().unwrap_or(22),
                        "--user" | "-u" => args.user = value,
                        "--password" | "-P" => args.password = Some(value),
                        "--enable-secret" => args.enable_secret = Some(value),
                        "--vendor" => args.vendor = value,
                        "--model" | "-m" => args.model = value,
                        "--command" | "-c" => args.command = value,
                        "--timeout" | "-t" => args.timeout = value.parse().unwrap_or(30),
                        _ => {
                            eprintln!("Unknown argument: {flag}");
                            print_help();
                            std::process::exit(1);
                        }
                    }
                }
            }
        }

        args
    }
}

fn print_help() {
    println!("Usage: onu_info [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -h, --host <HOST>          OLT address [default: localhost]");
    println!("  -p, --port <PORT>          SSH port [default: 22]");
    println!("  -u, --user <USER>          Username [default: admin]");
    println!("  -P, --password <PASSWORD>  Password");
    println!("      --enable-secret <PW>   Escalation secret [default: password]");
    println!("      --vendor <VENDOR>      Vendor [default: huawei]");
    println!("  -m, --model <MODEL>        Model, used for capability lookup");
    println!("  -c, --command <CMD>        Command to run");
    println!("      --enable               Escalate before running the command");
    println!("  -t, --timeout <SECS>       Command timeout [default: 30]");
}
