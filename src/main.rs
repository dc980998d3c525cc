mod logging;
mod simulator;

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle, sleep};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossterm::style::Stylize;
use tracing::{debug, info, warn};

use imu_frame_link::config::DEFAULT_BAUD_RATE;
use imu_frame_link::*;

use logging::{LogFormat, LogLevel};
use simulator::SyntheticImu;

// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                             Globals
// —————————————————————————————————————————————————————————————————————————————————————————————————

const READ_BUFFER_SIZE: usize = 2000;
const CONNECT_ATTEMPTS: usize = 10;
const IDLE_POLL: Duration = Duration::from_millis(1);

/// Port name meaning "write frames to stdout".
const STDOUT_PORT: &str = "-";

#[cfg(unix)]
type PortType = serialport::TTYPort;
#[cfg(windows)]
type PortType = serialport::COMPort;

// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                               CLI
// —————————————————————————————————————————————————————————————————————————————————————————————————

#[derive(Parser)]
#[command(name = "imu-link", version, about = "IMU telemetry over a checksummed serial link")]
struct Cli {
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true, env = "IMU_LINK_LOG")]
    log_level: LogLevel,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode and print frames arriving on a serial port
    Monitor(MonitorArgs),
    /// Stream frames from a synthetic IMU
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct PortArgs {
    /// Serial port. Defaults to the highest numbered port
    port: Option<String>,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,
}

#[derive(Args)]
struct MonitorArgs {
    #[command(flatten)]
    port: PortArgs,

    /// Byte order of float fields sent by the device
    #[arg(long, value_enum, default_value_t = FloatOrderArg::Big)]
    float_order: FloatOrderArg,
}

#[derive(Args)]
struct SimulateArgs {
    /// Serial port, or "-" for stdout
    port: Option<String>,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Comma separated: quat, euler, ypr, linear, world, raw (or all / none)
    #[arg(long, default_value = "quat")]
    fields: FieldConfig,

    #[arg(long, default_value_t = config::DEFAULT_SAMPLE_RATE_HZ)]
    rate_hz: u32,

    /// Stop after this many samples
    #[arg(long)]
    count: Option<u64>,

    #[arg(long, value_enum, default_value_t = PolicyArg::Halt)]
    policy: PolicyArg,

    /// Make this initialization stage report a failure
    #[arg(long, value_enum)]
    fail_stage: Option<StageArg>,

    /// Report a FIFO overflow every N reads
    #[arg(long)]
    overflow_every: Option<u64>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FloatOrderArg {
    Big,
    Little,
}

impl From<FloatOrderArg> for FloatOrder {
    fn from(arg: FloatOrderArg) -> Self {
        match arg {
            FloatOrderArg::Big => FloatOrder::Big,
            FloatOrderArg::Little => FloatOrder::Little,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PolicyArg {
    Continue,
    Halt,
}

impl From<PolicyArg> for InitPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Continue => InitPolicy::ReportAndContinue,
            PolicyArg::Halt => InitPolicy::HaltOnFailure,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StageArg {
    Device,
    Connection,
    Dmp,
    Interrupt,
}

impl From<StageArg> for StatusEvent {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Device => StatusEvent::DeviceInit,
            StageArg::Connection => StatusEvent::Connection,
            StageArg::Dmp => StatusEvent::DmpInit,
            StageArg::Interrupt => StatusEvent::InterruptConfig,
        }
    }
}

// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                              Main
// —————————————————————————————————————————————————————————————————————————————————————————————————

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format, cli.log_level);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("Error setting Ctrl-C handler")?;
    }

    match cli.command {
        Command::Monitor(args) => {
            let link = LinkConfig {
                port: args.port.port,
                baud_rate: args.port.baud,
                float_order: args.float_order.into(),
                ..Default::default()
            };
            run_monitor(&link, &stop)
        }
        Command::Simulate(args) => {
            let link = LinkConfig {
                port: args.port.clone(),
                baud_rate: args.baud,
                ..Default::default()
            };
            let sender = SenderConfig {
                fields:         args.fields,
                policy:         args.policy.into(),
                sample_rate_hz: args.rate_hz,
                max_samples:    args.count,
            };
            let imu = SyntheticImu::new(args.fail_stage.map(Into::into), args.overflow_every);
            run_simulate(&link, &sender, imu, &stop)
        }
    }
}

// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                             Monitor
// —————————————————————————————————————————————————————————————————————————————————————————————————

fn run_monitor(link: &LinkConfig, stop: &Arc<AtomicBool>) -> Result<()> {
    println!("\n=== IMU Link Monitor ===\n");

    while !stop.load(Ordering::SeqCst) {
        let input_port = link.port.as_deref().unwrap_or("");

        if input_port.is_empty() {
            println!("\nPort not provided. Connecting to largest port number.");
        }
        else {
            println!("\nInput Port");
            println!("==============");
            println!("{input_port}");
        }

        print_available_ports();

        print!("\nSearching for port ...");
        io::stdout().flush()?;

        let port_name = match find_port(input_port, stop) {
            Ok(name) => {
                println!();
                name
            }
            Err(e) => {
                eprintln!("\n{e:#}");
                continue;
            }
        };

        let port = match connect_to_port(&port_name, link) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("\n{e:#}\n");
                continue;
            }
        };

        if let Err(e) = handle_serial_read(port, link.float_order, stop) {
            eprintln!("\n\nError: {e:#}");
            eprintln!("Disconnected. Retrying Connection...\n");
            continue;
        }
    }

    println!("\nExiting...\n");
    Ok(())
}

// ———————————————————————————————————————————— Ports ——————————————————————————————————————————————

fn print_available_ports() {
    println!("\nAvailable Ports");
    println!("==============");
    match serialport::available_ports() {
        Ok(ports) if !ports.is_empty() => {
            for port in &ports {
                println!("{}", port.port_name);
            }
        }
        _ => println!("No Ports"),
    }
    println!("______________");
}

fn find_port(input_port: &str, stop: &AtomicBool) -> Result<String> {
    loop {
        if stop.load(Ordering::SeqCst) {
            bail!("Interrupted while searching for port");
        }

        let ports = serialport::available_ports().context("Failed to list ports")?;

        if !input_port.is_empty() {
            if ports.iter().any(|p| p.port_name == input_port) {
                return Ok(input_port.to_string());
            }
        }
        else {
            // Get highest port
            if let Some(port) = ports
                .iter()
                .max_by_key(|p| p.port_name.char_indices().last().unwrap_or((0, '0')).1)
            {
                return Ok(port.port_name.clone());
            }
        }

        print!(".");
        io::stdout().flush()?;
        sleep(Duration::from_secs(1));
    }
}

fn connect_to_port(port_name: &str, link: &LinkConfig) -> Result<PortType> {
    print!("Connecting to port: {port_name}");
    io::stdout().flush()?;

    let mut attempt = 1;
    loop {
        match serialport::new(port_name, link.baud_rate)
            .dtr_on_open(true)
            .timeout(link.timeout)
            .open_native()
        {
            Ok(port) => {
                println!("\n\nConnected!");
                println!("==============\n");
                info!(port = port_name, baud = link.baud_rate, "connected");
                return Ok(port);
            }
            Err(e) if attempt == CONNECT_ATTEMPTS => {
                return Err(e).context(format!("Failed after {CONNECT_ATTEMPTS} attempts"));
            }
            Err(e) => {
                debug!(attempt, error = %e, "connect failed");
                print!(".");
                io::stdout().flush()?;
                sleep(Duration::from_millis(500));
                attempt += 1;
            }
        }
    }
}

// ————————————————————————————————————— Handle Serial Data ————————————————————————————————————————

fn handle_serial_read(port: PortType, float_order: FloatOrder, stop: &Arc<AtomicBool>) -> Result<()> {
    let (main_tx, main_rx) = mpsc::channel::<ThreadMsg>();

    let reader = spawn_reader_thread(port, float_order, stop.clone(), main_tx);
    let mut failure = None;
    let mut corrupt = 0u64;

    // Ends when the reader drops its sender
    for msg in main_rx {
        match msg {
            ThreadMsg::Started => {
                println!("\nReader Started");
            }
            ThreadMsg::Text(s) => {
                print!("{s}");
            }
            ThreadMsg::Status(report) => {
                if report.is_ok() {
                    println!("{}", report.to_string().green());
                }
                else {
                    println!("{}", report.to_string().red());
                }
            }
            ThreadMsg::Telemetry(telemetry) => {
                print!("{telemetry}");
            }
            ThreadMsg::Corrupt { received, computed } => {
                corrupt += 1;
                warn!(received, computed, total = corrupt, "corrupt frame dropped");
            }
            ThreadMsg::Malformed(e) => {
                eprintln!("{}", format!("Malformed payload: {e}").yellow());
            }
            ThreadMsg::Error(e) => {
                failure = Some(e);
            }
            ThreadMsg::Exiting => {
                println!("\nReader Exiting");
            }
        }
        io::stdout().flush()?;
    }

    if reader.join().is_err() {
        bail!("Reader thread panicked");
    }

    match failure {
        Some(e) => bail!(e),
        None => Ok(()),
    }
}

// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                          Reader Thread
// —————————————————————————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
pub enum ThreadMsg {
    Started,
    Exiting,
    Error(String),
    Text(String),
    Status(StatusReport),
    Telemetry(Telemetry),
    Corrupt { received: u16, computed: u16 },
    Malformed(FrameError),
}

fn spawn_reader_thread(
    mut port: PortType,
    float_order: FloatOrder,
    stop: Arc<AtomicBool>,
    tx: mpsc::Sender<ThreadMsg>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let _ = tx.send(ThreadMsg::Started);

        let mut buffer = Vec::<u8>::with_capacity(READ_BUFFER_SIZE);
        let mut raw_read = [0u8; READ_BUFFER_SIZE];

        'read: while !stop.load(Ordering::SeqCst) {
            match port.read(&mut raw_read) {
                Ok(n) => {
                    buffer.extend_from_slice(&raw_read[..n]);

                    let FilterResult {
                        segments,
                        trim_index,
                    } = FrameDecoder::filter_buffer(&buffer);

                    for segment in segments {
                        if tx.send(segment_msg(segment, float_order)).is_err() {
                            break 'read;
                        }
                    }

                    // Remove processed slice
                    buffer.drain(..trim_index);
                }

                // Timeout > Ignore
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => (),

                // Error > Return
                Err(e) => {
                    let _ = tx.send(ThreadMsg::Error(format!("Serial read error: {e}")));
                    break 'read;
                }
            };
        }

        let _ = tx.send(ThreadMsg::Exiting);
    })
}

fn segment_msg(segment: Segment<'_>, float_order: FloatOrder) -> ThreadMsg {
    match segment {
        Segment::Text(bytes) => ThreadMsg::Text(String::from_utf8_lossy(bytes).into_owned()),
        Segment::Corrupt { received, computed } => ThreadMsg::Corrupt { received, computed },
        Segment::Frame(payload) => match Message::decode(payload, float_order) {
            Ok(Message::Status(report)) => ThreadMsg::Status(report),
            Ok(Message::Telemetry(telemetry)) => ThreadMsg::Telemetry(telemetry),
            Err(e) => ThreadMsg::Malformed(e),
        },
    }
}

// —————————————————————————————————————————————————————————————————————————————————————————————————
//                                             Simulate
// —————————————————————————————————————————————————————————————————————————————————————————————————

fn run_simulate(
    link: &LinkConfig,
    cfg: &SenderConfig,
    mut imu: SyntheticImu,
    stop: &Arc<AtomicBool>,
) -> Result<()> {
    let sink: Box<dyn Write> = match link.port.as_deref() {
        Some(STDOUT_PORT) => Box::new(io::stdout().lock()),
        port => {
            let port_name = find_port(port.unwrap_or(""), stop)?;
            Box::new(connect_to_port(&port_name, link)?)
        }
    };

    let encoder = FrameEncoder::new(FieldSelector::new(cfg.fields))?;
    info!(
        fields = %cfg.fields,
        mask = encoder.selector().type_mask(),
        frame_len = encoder.frame_len(),
        "simulating"
    );

    let mut sender = Sender::new(sink, encoder, cfg.policy);
    let state = sender.initialize(&mut imu)?;
    if !sender.is_streaming() {
        bail!("Initialization halted in state {state:?}");
    }

    // Stands in for the sensor's data ready interrupt
    let ready = Arc::new(DataReady::new());
    let done = Arc::new(AtomicBool::new(false));
    let ticker = {
        let (ready, done, stop) = (ready.clone(), done.clone(), stop.clone());
        let period = cfg.sample_period();
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) && !stop.load(Ordering::SeqCst) {
                sleep(period);
                ready.signal();
            }
        })
    };

    let result = stream(&mut sender, &mut imu, &ready, cfg.max_samples, stop);

    done.store(true, Ordering::Release);
    let _ = ticker.join();

    result?;
    info!(frames = sender.frames_sent(), samples = imu.samples(), "simulation done");
    Ok(())
}

fn stream<W: Write>(
    sender: &mut Sender<W>,
    imu: &mut SyntheticImu,
    ready: &DataReady,
    max_samples: Option<u64>,
    stop: &AtomicBool,
) -> Result<()> {
    while !stop.load(Ordering::SeqCst) {
        if max_samples.is_some_and(|max| imu.samples() >= max) {
            break;
        }
        if !sender.poll(imu, ready).context("Failed to send frame")? {
            sleep(IDLE_POLL);
        }
    }
    Ok(())
}
