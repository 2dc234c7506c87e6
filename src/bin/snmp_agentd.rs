//! snmp-agentd: a small SNMP v1/v2c agent serving the system group.
//!
//! Test with:
//!   snmpwalk -v2c -c public localhost:1161 system
//!   snmpset -v2c -c public localhost:1161 sysContact.0 s ops@example.com
//!   snmpbulkwalk -v2c -c public localhost:1161 ifTable

use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_snmp_agent::handler::{
    Registration, Reply, RowTable, provider_fn, read_only_scalar, writable_scalar,
};
use async_snmp_agent::{Agent, ErrorStatus, PduType, Value, oid};
use clap::Parser;

/// Serve the SNMPv2-MIB system group and a demo interface table.
#[derive(Debug, Parser)]
#[command(name = "snmp-agentd", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0:1161")]
    bind: String,

    /// Accepted community string (repeatable; none accepts any).
    #[arg(short, long = "community", value_name = "COMMUNITY")]
    communities: Vec<String>,

    /// Value of sysDescr.0.
    #[arg(long, default_value = "async-snmp-agent demo agent")]
    descr: String,

    /// Initial value of sysContact.0.
    #[arg(long, default_value = "")]
    contact: String,

    /// Initial value of sysName.0.
    #[arg(long, default_value = "")]
    name: String,

    /// Initial value of sysLocation.0.
    #[arg(long, default_value = "")]
    location: String,

    /// Interface names for the demo ifTable.
    #[arg(long = "interface", value_name = "NAME", default_values_t = ["lo".to_string(), "eth0".to_string()])]
    interfaces: Vec<String>,

    /// Fail a variable binding whose provider takes longer than this many milliseconds.
    #[arg(long, value_name = "MS")]
    provider_timeout: Option<u64>,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging.
    #[arg(long)]
    trace: bool,
}

impl Args {
    fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let default = if self.trace {
            "async_snmp_agent=trace"
        } else if self.debug {
            "async_snmp_agent=debug"
        } else {
            "async_snmp_agent=info"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// A writable DisplayString scalar.
fn display_string(oid: &str, initial: String) -> async_snmp_agent::Result<Registration> {
    let current = Mutex::new(Value::from(initial));
    Registration::scalar(
        oid,
        provider_fn(move |req| {
            let Ok(mut current) = current.lock() else {
                return Reply::Error(ErrorStatus::GenErr);
            };
            if req.op == PduType::SetRequest {
                match req.value.as_ref().map(|data| data.value()) {
                    Some(value @ Value::OctetString(_)) => *current = value.clone(),
                    _ => return Reply::Error(ErrorStatus::WrongType),
                }
            }
            writable_scalar(req, current.clone())
        }),
    )
}

fn system_group(args: &Args) -> async_snmp_agent::Result<Vec<Registration>> {
    let started = Instant::now();
    let descr = args.descr.clone();

    Ok(vec![
        Registration::scalar(
            "1.3.6.1.2.1.1.1",
            provider_fn(move |req| read_only_scalar(req, descr.as_str())),
        )?,
        Registration::scalar(
            "1.3.6.1.2.1.1.2",
            provider_fn(|req| read_only_scalar(req, oid!(1, 3, 6, 1, 4, 1, 99999))),
        )?,
        Registration::scalar(
            "1.3.6.1.2.1.1.3",
            provider_fn(move |req| {
                let ticks = (started.elapsed().as_millis() / 10) as u32;
                read_only_scalar(req, Value::TimeTicks(ticks))
            }),
        )?,
        display_string("1.3.6.1.2.1.1.4", args.contact.clone())?,
        display_string("1.3.6.1.2.1.1.5", args.name.clone())?,
        display_string("1.3.6.1.2.1.1.6", args.location.clone())?,
        Registration::scalar(
            "1.3.6.1.2.1.1.7",
            provider_fn(|req| read_only_scalar(req, Value::Integer(72))),
        )?,
    ])
}

/// ifNumber and ifEntry with ifIndex (1) and ifDescr (2).
fn interfaces(args: &Args) -> async_snmp_agent::Result<Vec<Registration>> {
    let mut rows = RowTable::new();
    for (i, name) in (1..).zip(&args.interfaces) {
        rows.insert(&[i], (i as i32, name.clone()));
    }
    let count = rows.len() as i32;
    let rows = Arc::new(rows);

    Ok(vec![
        Registration::scalar(
            "1.3.6.1.2.1.2.1",
            provider_fn(move |req| read_only_scalar(req, Value::Integer(count))),
        )?,
        Registration::table(
            "1.3.6.1.2.1.2.2.1",
            [1, 2],
            provider_fn(move |req| {
                let column = req.node.arcs().last().copied();
                rows.reply(req, |(index, name)| match column {
                    Some(1) => Value::Integer(*index),
                    _ => Value::from(name.as_str()),
                })
            }),
        )?,
    ])
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.init_tracing();

    let registrations = match (system_group(&args), interfaces(&args)) {
        (Ok(system), Ok(interfaces)) => system.into_iter().chain(interfaces),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.communities.is_empty() {
        tracing::warn!(target: "async_snmp_agent::agent", "no community configured, accepting any community");
    }
    let builder = Agent::builder()
        .bind(args.bind.clone())
        .communities(&args.communities)
        .providers(registrations)
        .provider_timeout(args.provider_timeout.map(Duration::from_millis));

    let agent = match builder.build().await {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = agent.cancel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    match agent.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
