//! Command line front end
//!
//! Validation problems print the usage text and exit with a code specific to
//! the command; bus failures are logged and exit with 1.

use crate::{
    device::Device,
    error::Error,
    registers::{
        ADDRESSES, ANALOG_INPUTS, DEFAULT_ADDRESS, DEFAULT_BUS, DIGITAL_INPUTS, RELAY_NUMBERS,
    },
    transport::Transport,
};
use std::{error, fmt, io, ops::RangeInclusive};

pub const USAGE: &str = "\
usage: modio [-b BUS] [-a ADDRESS] COMMAND [ARGS]

options:
  -b, --bus BUS          i2c bus number (default 1)
  -a, --address ADDRESS  board address, decimal or 0x.. (default 0x48)

commands:
  relay open|close NUMBER   open or close relay 1 or 2
  read-ain NUMBER           print the value of analog input 1 to 8
  read-din NUMBER           print the level of digital input 0 to 3
  relays                    print the relay mask after the power-up reset
  change-address ADDRESS    move the board to another bus address
  help                      show this text

Set RUST_LOG=debug to see bus traffic.";

pub const EXIT_OK: i32 = 0;
pub const EXIT_NO_COMMAND: i32 = 1;
/// The bus could not be opened, the board did not answer or output failed.
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_UNKNOWN_COMMAND: i32 = 2;
pub const EXIT_BAD_OPTION: i32 = 3;
pub const EXIT_RELAY_ARGS: i32 = 10;
pub const EXIT_RELAY_ACTION: i32 = 11;
pub const EXIT_RELAY_NUMBER: i32 = 12;
pub const EXIT_AIN_ARGS: i32 = 20;
pub const EXIT_AIN_NUMBER: i32 = 21;
pub const EXIT_DIN_ARGS: i32 = 30;
pub const EXIT_DIN_NUMBER: i32 = 31;
pub const EXIT_ADDRESS_ARGS: i32 = 40;
pub const EXIT_ADDRESS_VALUE: i32 = 41;
pub const EXIT_RELAYS_ARGS: i32 = 50;

/// Where the board lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    pub bus: u32,
    pub address: u8,
}

impl Default for Options {
    fn default() -> Options {
        Options { bus: DEFAULT_BUS, address: DEFAULT_ADDRESS }
    }
}

impl Options {
    /// Consumes leading options, returning them with the remaining arguments.
    pub fn parse(args: &[String]) -> Result<(Options, &[String]), String> {
        let mut opts = Options::default();
        let mut rest = args;
        while let Some(flag) = rest.first().filter(|a| a.starts_with('-')) {
            let value = rest.get(1).ok_or_else(|| format!("option {} needs a value", flag));
            match flag.as_str() {
                "-b" | "--bus" => {
                    let value = value?;
                    opts.bus = value.parse().map_err(|_| format!("invalid bus number {}", value))?;
                },
                "-a" | "--address" => {
                    let value = value?;
                    opts.address = parse_number(value)
                        .and_then(|a| u8::try_from(a).ok())
                        .ok_or_else(|| format!("invalid address {}", value))?;
                },
                // help is a command of its own
                "-h" | "--help" => break,
                _ => return Err(format!("unknown option {}", flag)),
            }
            rest = &rest[2..];
        }
        Ok((opts, rest))
    }
}

/// Decimal, or hexadecimal with a `0x` prefix.
pub fn parse_number(s: &str) -> Option<i32> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => i32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn usage(code: i32, problem: impl fmt::Display) -> i32 {
    eprintln!("{}\n\n{}", problem, USAGE);
    code
}

/// Runs the command in `args` (program name already stripped) against the
/// board `factory` opens, writing results to `out`. Returns the exit code.
pub fn run<T, F, E, W>(args: &[String], factory: F, out: &mut W) -> i32
where
    T: Transport,
    F: FnOnce(u32, u8) -> Result<T, E>,
    E: error::Error + Send + Sync + 'static,
    W: io::Write,
{
    let (opts, args) = match Options::parse(args) {
        Ok(parsed) => parsed,
        Err(problem) => return usage(EXIT_BAD_OPTION, problem),
    };
    let (command, args) = match args.split_first() {
        Some((command, args)) => (command.as_str(), args),
        None => return usage(EXIT_NO_COMMAND, "no command given"),
    };
    let open = move || Device::open(opts.address, opts.bus, factory);

    let res = match command {
        "help" | "-h" | "--help" => {
            return match writeln!(out, "{}", USAGE) {
                Ok(()) => EXIT_OK,
                Err(err) => output_failed(err),
            };
        },
        "relay" => relay(args, open),
        "read-ain" => read_ain(args, open, out),
        "read-din" => read_din(args, open, out),
        "relays" => relays(args, open, out),
        "change-address" => change_address(args, open),
        _ => return usage(EXIT_UNKNOWN_COMMAND, format!("unknown command {}", command)),
    };
    match res {
        Ok(code) => code,
        Err(Failure::Bus(err)) => {
            log::error!("{}", err);
            let mut source = error::Error::source(&err);
            while let Some(cause) = source {
                log::error!("  caused by: {}", cause);
                source = error::Error::source(cause);
            }
            EXIT_FAILURE
        },
        Err(Failure::Output(err)) => output_failed(err),
    }
}

fn output_failed(err: io::Error) -> i32 {
    log::error!("could not write output: {}", err);
    EXIT_FAILURE
}

enum Failure {
    Bus(Error),
    Output(io::Error),
}

impl From<Error> for Failure {
    fn from(err: Error) -> Failure {
        Failure::Bus(err)
    }
}

impl From<io::Error> for Failure {
    fn from(err: io::Error) -> Failure {
        Failure::Output(err)
    }
}

type Outcome = Result<i32, Failure>;

/// Maps validation errors to `code`, passes bus errors on.
fn invalid_as(code: i32, res: crate::Result<()>) -> Outcome {
    match res {
        Ok(()) => Ok(EXIT_OK),
        Err(err) if err.is_invalid_input() => Ok(usage(code, err)),
        Err(err) => Err(err.into()),
    }
}

/// Parses `arg` and checks it against `range` before the board is touched.
fn number(arg: &str, range: RangeInclusive<i32>, code: i32, what: &str) -> Result<i32, i32> {
    parse_number(arg)
        .filter(|n| range.contains(n))
        .ok_or_else(|| usage(code, format!("invalid {} {}", what, arg)))
}

fn relay<T, O>(args: &[String], open: O) -> Outcome
where
    T: Transport,
    O: FnOnce() -> crate::Result<Device<T>>,
{
    let [action, num] = args else {
        return Ok(usage(EXIT_RELAY_ARGS, "relay takes an action and a relay number"));
    };
    let close = match action.as_str() {
        "open" => false,
        "close" => true,
        _ => {
            let problem = format!("relay action must be open or close, not {}", action);
            return Ok(usage(EXIT_RELAY_ACTION, problem));
        },
    };
    let num = match number(num, RELAY_NUMBERS, EXIT_RELAY_NUMBER, "relay number") {
        Ok(num) => num,
        Err(code) => return Ok(code),
    };
    let board = open()?;
    invalid_as(
        EXIT_RELAY_NUMBER,
        if close { board.close_contact_relay(num) } else { board.open_contact_relay(num) },
    )
}

fn read_ain<T, O, W>(args: &[String], open: O, out: &mut W) -> Outcome
where
    T: Transport,
    O: FnOnce() -> crate::Result<Device<T>>,
    W: io::Write,
{
    let [num] = args else {
        return Ok(usage(EXIT_AIN_ARGS, "read-ain takes an input number"));
    };
    let num = match number(num, ANALOG_INPUTS, EXIT_AIN_NUMBER, "analog input") {
        Ok(num) => num,
        Err(code) => return Ok(code),
    };
    let board = open()?;
    match board.read_ain(num) {
        Ok(value) => writeln!(out, "{}", value)?,
        Err(err) => return invalid_as(EXIT_AIN_NUMBER, Err(err)),
    }
    Ok(EXIT_OK)
}

fn read_din<T, O, W>(args: &[String], open: O, out: &mut W) -> Outcome
where
    T: Transport,
    O: FnOnce() -> crate::Result<Device<T>>,
    W: io::Write,
{
    let [num] = args else {
        return Ok(usage(EXIT_DIN_ARGS, "read-din takes an input number"));
    };
    let num = match number(num, DIGITAL_INPUTS, EXIT_DIN_NUMBER, "digital input") {
        Ok(num) => num,
        Err(code) => return Ok(code),
    };
    let board = open()?;
    match board.get_digital_in(num) {
        Ok(level) => writeln!(out, "{}", level as u8)?,
        Err(err) => return invalid_as(EXIT_DIN_NUMBER, Err(err)),
    }
    Ok(EXIT_OK)
}

fn relays<T, O, W>(args: &[String], open: O, out: &mut W) -> Outcome
where
    T: Transport,
    O: FnOnce() -> crate::Result<Device<T>>,
    W: io::Write,
{
    if !args.is_empty() {
        return Ok(usage(EXIT_RELAYS_ARGS, "relays takes no arguments"));
    }
    let board = open()?;
    writeln!(out, "{}", board.get_relays())?;
    Ok(EXIT_OK)
}

fn change_address<T, O>(args: &[String], open: O) -> Outcome
where
    T: Transport,
    O: FnOnce() -> crate::Result<Device<T>>,
{
    let [address] = args else {
        return Ok(usage(EXIT_ADDRESS_ARGS, "change-address takes the new address"));
    };
    let address = match number(address, ADDRESSES, EXIT_ADDRESS_VALUE, "address") {
        Ok(address) => address,
        Err(code) => return Ok(code),
    };
    let board = open()?;
    invalid_as(EXIT_ADDRESS_VALUE, board.change_address(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeBus;
    use std::convert::Infallible;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn exec(line: &str) -> (i32, String) {
        let mut out = Vec::new();
        let code = run(&args(line), FakeBus::open, &mut out);
        (code, String::from_utf8(out).unwrap())
    }

    /// Runs `line` with a fake bus that answers reads with `reply`, returning
    /// the exit code, the output and the bus.
    fn exec_with(line: &str, reply: &[u8]) -> (i32, String, Option<FakeBus>) {
        let mut out = Vec::new();
        let seen = std::cell::RefCell::new(None);
        let code = run(
            &args(line),
            |bus, address| {
                let bus = FakeBus::new(bus, address).with_reply(reply);
                Ok::<_, Infallible>(Probe(bus, &seen))
            },
            &mut out,
        );
        (code, String::from_utf8(out).unwrap(), seen.into_inner())
    }

    /// Hands its bus back when dropped so tests can look at the traffic.
    struct Probe<'a>(FakeBus, &'a std::cell::RefCell<Option<FakeBus>>);

    impl Drop for Probe<'_> {
        fn drop(&mut self) {
            let bus = std::mem::replace(&mut self.0, FakeBus::new(0, 0));
            *self.1.borrow_mut() = Some(bus);
        }
    }

    impl Transport for Probe<'_> {
        type Error = Infallible;

        fn address(&self) -> u8 {
            self.0.address()
        }

        fn set_address(&mut self, address: u8) {
            self.0.set_address(address)
        }

        fn write(&mut self, register: u8, value: u8) -> Result<(), Infallible> {
            self.0.write(register, value)
        }

        fn read_block(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), Infallible> {
            self.0.read_block(register, buffer)
        }
    }

    #[test]
    fn missing_and_unknown_commands() {
        assert_eq!(exec("").0, EXIT_NO_COMMAND);
        assert_eq!(exec("blink").0, EXIT_UNKNOWN_COMMAND);
        assert_eq!(exec("-b 1").0, EXIT_NO_COMMAND);
    }

    #[test]
    fn help_goes_to_output() {
        let (code, out) = exec("help");
        assert_eq!(code, EXIT_OK);
        assert!(out.starts_with("usage: modio"));
        assert_eq!(exec("--help").0, EXIT_OK);
    }

    #[test]
    fn relay_exit_codes() {
        assert_eq!(exec("relay close 1").0, EXIT_OK);
        assert_eq!(exec("relay open 2").0, EXIT_OK);
        assert_eq!(exec("relay close").0, EXIT_RELAY_ARGS);
        assert_eq!(exec("relay close 1 2").0, EXIT_RELAY_ARGS);
        assert_eq!(exec("relay toggle 1").0, EXIT_RELAY_ACTION);
        assert_eq!(exec("relay close 3").0, EXIT_RELAY_NUMBER);
        assert_eq!(exec("relay close one").0, EXIT_RELAY_NUMBER);
    }

    #[test]
    fn relay_close_hits_the_bus() {
        let (code, _, bus) = exec_with("-a 0x22 relay close 2", &[]);
        assert_eq!(code, EXIT_OK);
        let bus = bus.unwrap();
        assert_eq!(bus.address(), 0x22);
        assert_eq!(bus.writes(), vec![(0x40, 0), (0x40, 2)]);
    }

    #[test]
    fn read_ain_prints_value() {
        let (code, out, _) = exec_with("read-ain 3", &[0x39, 0x00]);
        assert_eq!(code, EXIT_OK);
        assert_eq!(out, "57\n");
    }

    #[test]
    fn read_ain_exit_codes() {
        assert_eq!(exec("read-ain").0, EXIT_AIN_ARGS);
        assert_eq!(exec("read-ain 1 2").0, EXIT_AIN_ARGS);
        assert_eq!(exec("read-ain 9").0, EXIT_AIN_NUMBER);
        assert_eq!(exec("read-ain x").0, EXIT_AIN_NUMBER);
    }

    #[test]
    fn read_din_prints_level() {
        let (code, out, _) = exec_with("read-din 2", &[0b0100, 0]);
        assert_eq!(code, EXIT_OK);
        assert_eq!(out, "1\n");
        assert_eq!(exec("read-din").0, EXIT_DIN_ARGS);
        assert_eq!(exec("read-din 4").0, EXIT_DIN_NUMBER);
    }

    #[test]
    fn relays_prints_mask() {
        assert_eq!(exec("relays"), (EXIT_OK, "0\n".to_string()));
        assert_eq!(exec("relays 1").0, EXIT_RELAYS_ARGS);
    }

    #[test]
    fn change_address_exit_codes() {
        let (code, _, bus) = exec_with("change-address 0x30", &[]);
        assert_eq!(code, EXIT_OK);
        assert_eq!(bus.unwrap().address(), 0x30);
        assert_eq!(exec("change-address").0, EXIT_ADDRESS_ARGS);
        assert_eq!(exec("change-address 300").0, EXIT_ADDRESS_VALUE);
    }

    #[test]
    fn unavailable_bus_exits_with_failure() {
        let mut out = Vec::new();
        let code = run(
            &args("relay close 1"),
            |_, _| Err::<FakeBus, _>(io::Error::new(io::ErrorKind::NotFound, "no /dev/i2c-1")),
            &mut out,
        );
        assert_eq!(code, EXIT_FAILURE);
    }

    #[test]
    fn rejected_numbers_never_open_the_board() {
        for (line, code) in [
            ("relay close 3", EXIT_RELAY_NUMBER),
            ("relay open 0", EXIT_RELAY_NUMBER),
            ("read-ain 9", EXIT_AIN_NUMBER),
            ("read-din 4", EXIT_DIN_NUMBER),
            ("change-address 300", EXIT_ADDRESS_VALUE),
        ] {
            let (exit, out, bus) = exec_with(line, &[]);
            assert_eq!(exit, code, "{}", line);
            assert!(out.is_empty());
            assert!(bus.is_none(), "{} reached the bus", line);
        }
    }

    #[test]
    fn options_parse() {
        let a = args("-b 0 --address 0x58 relay open 1");
        let (opts, rest) = Options::parse(&a).unwrap();
        assert_eq!(opts, Options { bus: 0, address: 0x58 });
        assert_eq!(rest, &a[4..]);
        assert!(Options::parse(&args("-a 0x100 relays")).is_err());
        assert!(Options::parse(&args("-b")).is_err());
        assert!(Options::parse(&args("--verbose relays")).is_err());
        assert_eq!(exec("-x relays").0, EXIT_BAD_OPTION);
    }

    #[test]
    fn numbers_accept_hex() {
        assert_eq!(parse_number("0x48"), Some(0x48));
        assert_eq!(parse_number("72"), Some(72));
        assert_eq!(parse_number("-1"), Some(-1));
        assert_eq!(parse_number("0xzz"), None);
    }
}
