//! Global configuration.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ansi_term::{Colour, Style};
use clap::Arg;
use rsmt2::SmtConf as SolverConf;

use crate::errors::*;

/// Clap `App` with static lifetimes.
pub type App = ::clap::App<'static, 'static>;
/// Clap `ArgMatches` with static lifetime.
pub type Matches = ::clap::ArgMatches<'static>;

/// Format of boolean options.
static bool_format: &str = "on/off";

/// Boolean of a string.
pub fn bool_of_str(s: &str) -> Option<bool> {
    match s {
        "on" | "true" => Some(true),
        "off" | "false" => Some(false),
        _ => None,
    }
}

/// Boolean of some matches.
///
/// Assumes a default is provided and the input has been validated with
/// `bool_validator`.
pub fn bool_of_matches(matches: &Matches, key: &str) -> bool {
    matches
        .value_of(key)
        .and_then(bool_of_str)
        .expect("failed to retrieve boolean argument")
}

/// Validates boolean input.
#[allow(clippy::needless_pass_by_value)]
pub fn bool_validator(s: String) -> Result<(), String> {
    if bool_of_str(&s).is_some() {
        Ok(())
    } else {
        Err(format!("expected `on/true` or `off/false`, got `{}`", s))
    }
}

/// Validates integer input.
#[allow(clippy::needless_pass_by_value)]
pub fn int_validator(s: String) -> Result<(), String> {
    match usize::from_str_radix(&s, 10) {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("expected an integer, got `{}`", s)),
    }
}

/// Integer of some matches.
pub fn int_of_matches(matches: &Matches, key: &str) -> usize {
    matches
        .value_of(key)
        .map(|s| usize::from_str_radix(s, 10))
        .expect("failed to retrieve integer argument")
        .expect("failed to retrieve integer argument")
}

/// Verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verb {
    /// Quiet.
    Quiet,
    /// Verbose.
    Verb,
    /// Debug.
    Debug,
}
impl Verb {
    /// Default verbosity.
    pub fn default() -> Self {
        Verb::Quiet
    }
    /// Increments verbosity.
    pub fn inc(&mut self) {
        match *self {
            Verb::Quiet => *self = Verb::Verb,
            Verb::Verb => *self = Verb::Debug,
            Verb::Debug => (),
        }
    }
    /// Decrements verbosity.
    pub fn dec(&mut self) {
        match *self {
            Verb::Debug => *self = Verb::Verb,
            Verb::Verb => *self = Verb::Quiet,
            Verb::Quiet => (),
        }
    }
    /// True iff verbose or debug.
    pub fn verbose(self) -> bool {
        self != Verb::Quiet
    }
    /// True iff debug.
    pub fn debug(self) -> bool {
        self == Verb::Debug
    }
}

/// Contains the coloring styles.
pub struct Styles {
    /// Emphasis style.
    emph: Style,
    /// Happy style.
    hap: Style,
    /// Sad style.
    sad: Style,
    /// Bad style.
    bad: Style,
}
impl Styles {
    /// Constructor, with or without colors.
    pub fn new(colored: bool) -> Self {
        if colored && ::atty::is(::atty::Stream::Stdout) {
            Styles {
                emph: Style::new().bold(),
                hap: Colour::Green.normal().bold(),
                sad: Colour::Yellow.normal().bold(),
                bad: Colour::Red.normal().bold(),
            }
        } else {
            Styles {
                emph: Style::new(),
                hap: Style::new(),
                sad: Style::new(),
                bad: Style::new(),
            }
        }
    }
}

/// Functions all sub-configurations must have.
pub trait SubConf {
    /// True if the options of the subconf need the output directory.
    fn need_out_dir(&self) -> bool;
    /// Initializes stuff (creates directories, typically).
    fn init(&self) -> Res<()>;
}

/// Solver configuration.
pub struct SmtConf {
    /// Command used to call the solver.
    pub cmd: String,
    /// Smt logging flag.
    pub log: bool,
}
impl SubConf for SmtConf {
    fn need_out_dir(&self) -> bool {
        self.log
    }
    fn init(&self) -> Res<()> {
        if let Some(path) = self.log_dir() {
            ::std::fs::DirBuilder::new()
                .recursive(true)
                .create(path)
                .chain_err(|| "while creating smt output directory")?
        }
        Ok(())
    }
}
impl SmtConf {
    /// Actual, `rsmt2` solver configuration.
    pub fn conf(&self) -> SolverConf {
        let mut conf = SolverConf::z3(self.cmd.clone());
        conf.models();
        conf
    }

    /// Spawns a solver.
    ///
    /// If logging is active, the solver is teed to a file named after
    /// `name` in the smt log directory.
    pub fn spawn<Parser>(&self, name: &'static str, parser: Parser) -> Res<::rsmt2::Solver<Parser>> {
        let mut solver = ::rsmt2::Solver::new(self.conf(), parser)
            .chain_err(|| "while spawning the smt solver")?;
        if let Some(file) = self.log_file(name)? {
            solver
                .tee(file)
                .chain_err(|| "while setting up smt logging")?
        }
        Ok(solver)
    }

    /// Smt log dir, if any.
    pub fn log_dir(&self) -> Option<PathBuf> {
        if self.log {
            let mut path = crate::common::conf.out_dir();
            path.push("solvers");
            Some(path)
        } else {
            None
        }
    }

    /// Smt log file, if any.
    pub fn log_file<S: AsRef<str>>(&self, name: S) -> Res<Option<::std::fs::File>> {
        use std::fs::OpenOptions;
        if let Some(mut path) = self.log_dir() {
            path.push(name.as_ref());
            path.set_extension("smt2");
            let file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(&path)
                .chain_err(|| format!("while creating smt log file `{}`", path.display()))?;
            Ok(Some(file))
        } else {
            Ok(None)
        }
    }

    /// Adds clap options to a clap App.
    pub fn add_args(app: App) -> App {
        app.arg(
            Arg::with_name("z3_cmd")
                .long("--z3")
                .help("sets the command used to call z3")
                .default_value("z3")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("smt_log")
                .long("--smt_log")
                .help("(de)activates smt logging to the output directory")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("off")
                .takes_value(true),
        )
    }

    /// Creates itself from some matches.
    pub fn new(matches: &Matches) -> Self {
        let cmd = matches
            .value_of("z3_cmd")
            .expect("unreachable(z3_cmd): default is provided")
            .to_string();
        let log = bool_of_matches(matches, "smt_log");
        SmtConf { cmd, log }
    }
}

/// Synthesis loop configuration.
///
/// Per-solve knobs: the global configuration provides the defaults, but a
/// solver can be created with a custom value.
#[derive(Debug, Clone)]
pub struct CegConf {
    /// Maximum expression cost explored.
    pub cost_budget: usize,
    /// Disables signature-based pruning and restart-on-counter-example.
    pub no_dist: bool,
    /// Verbosity of solver diagnostics, `0` to `6`.
    pub stats_level: u8,
}
impl Default for CegConf {
    fn default() -> Self {
        CegConf {
            cost_budget: 64,
            no_dist: false,
            stats_level: 0,
        }
    }
}
impl SubConf for CegConf {
    fn need_out_dir(&self) -> bool {
        false
    }
    fn init(&self) -> Res<()> {
        Ok(())
    }
}
impl CegConf {
    /// Adds clap options to a clap App.
    pub fn add_args(app: App) -> App {
        app.arg(
            Arg::with_name("cost_budget")
                .long("--cost_budget")
                .help("maximum candidate expression cost explored")
                .validator(int_validator)
                .value_name("int")
                .default_value("64")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("no_dist")
                .long("--no_dist")
                .help("deactivates distinguishability pruning and restarts")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("off")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("stats_level")
                .long("--stats_level")
                .help("verbosity of solver diagnostics (0-6)")
                .validator(int_validator)
                .value_name("int")
                .default_value("0")
                .takes_value(true),
        )
    }

    /// Creates itself from some matches.
    pub fn new(matches: &Matches) -> Self {
        let cost_budget = int_of_matches(matches, "cost_budget");
        let no_dist = bool_of_matches(matches, "no_dist");
        let stats_level = int_of_matches(matches, "stats_level") as u8;
        CegConf {
            cost_budget,
            no_dist,
            stats_level,
        }
    }
}

/// Global configuration.
pub struct Config {
    /// Verbosity.
    pub verb: Verb,
    /// Statistics flag.
    pub stats: bool,
    /// Output directory.
    out_dir: String,
    /// Styles, for coloring.
    styles: Styles,
    /// Global timeout in seconds.
    timeout: Option<usize>,
    /// Instant the configuration was created, for timeout checks.
    instant: Instant,
    /// Solver configuration.
    pub solver: SmtConf,
    /// Synthesis loop configuration.
    pub ceg: CegConf,
}
impl Config {
    /// Output directory as a `PathBuf`.
    pub fn out_dir(&self) -> PathBuf {
        PathBuf::from(&self.out_dir)
    }
    /// True iff verbose or debug.
    pub fn verbose(&self) -> bool {
        self.verb.verbose()
    }
    /// True iff debug.
    pub fn debug(&self) -> bool {
        self.verb.debug()
    }
    /// Timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(|secs| Duration::from_secs(secs as u64))
    }

    /// Checks the wall-clock ceiling.
    ///
    /// Polled cooperatively at every enumeration callback.
    pub fn check_timeout(&self) -> Res<()> {
        if let Some(timeout) = self.timeout() {
            if Instant::now().duration_since(self.instant) > timeout {
                bail!(ErrorKind::Timeout)
            }
        }
        Ok(())
    }

    /// Initializes stuff (creates the output directories needed).
    pub fn init(&self) -> Res<()> {
        if self.solver.need_out_dir() || self.ceg.need_out_dir() {
            ::std::fs::DirBuilder::new()
                .recursive(true)
                .create(&self.out_dir)
                .chain_err(|| format!("while creating output directory `{}`", self.out_dir))?
        }
        self.solver.init()?;
        self.ceg.init()?;
        Ok(())
    }

    /// String emphasis.
    pub fn emph<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles.emph.paint(s.as_ref()))
    }
    /// Happy string.
    pub fn happy<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles.hap.paint(s.as_ref()))
    }
    /// Sad string.
    pub fn sad<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles.sad.paint(s.as_ref()))
    }
    /// Bad string.
    pub fn bad<S: AsRef<str>>(&self, s: S) -> String {
        format!("{}", self.styles.bad.paint(s.as_ref()))
    }

    /// Parses command-line arguments and generates the configuration.
    pub fn clap() -> Self {
        let mut app = App::new("cegen")
            .version(env!("CARGO_PKG_VERSION"))
            .about("counter-example guided enumerative synthesis");
        app = Self::add_args(app);
        app = SmtConf::add_args(app);
        app = CegConf::add_args(app);

        let matches = app.get_matches();

        let mut verb = Verb::default();
        for _ in 0..matches.occurrences_of("verb") {
            verb.inc()
        }
        for _ in 0..matches.occurrences_of("quiet") {
            verb.dec()
        }

        let color = bool_of_matches(&matches, "color");
        let styles = Styles::new(color);

        let out_dir = matches
            .value_of("out_dir")
            .expect("unreachable(out_dir): default is provided")
            .to_string();

        let stats = bool_of_matches(&matches, "stats");

        let timeout = match matches.value_of("timeout").map(|s| usize::from_str_radix(s, 10)) {
            None | Some(Ok(0)) => None,
            Some(Ok(secs)) => Some(secs),
            Some(Err(_)) => unreachable!("timeout is validated by clap"),
        };

        let solver = SmtConf::new(&matches);
        let ceg = CegConf::new(&matches);

        Config {
            verb,
            stats,
            out_dir,
            styles,
            timeout,
            instant: Instant::now(),
            solver,
            ceg,
        }
    }

    /// Adds clap options to a clap App.
    pub fn add_args(app: App) -> App {
        app.arg(
            Arg::with_name("input file")
                .help("input file (ignored, reserved for host drivers)")
                .index(1),
        )
        .arg(
            Arg::with_name("verb")
                .short("-v")
                .help("increases verbosity")
                .multiple(true),
        )
        .arg(
            Arg::with_name("quiet")
                .short("-q")
                .help("decreases verbosity")
                .multiple(true),
        )
        .arg(
            Arg::with_name("color")
                .long("--color")
                .help("(de)activates coloring")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("on")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("out_dir")
                .long("--out_dir")
                .help("sets the output directory")
                .value_name("dir")
                .default_value("cegen_out")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("stats")
                .long("--stats")
                .help("reports solve statistics at the end of the run")
                .validator(bool_validator)
                .value_name(bool_format)
                .default_value("off")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("timeout")
                .long("--timeout")
                .short("-t")
                .help("sets a timeout in seconds, `0` for none")
                .validator(int_validator)
                .value_name("int")
                .default_value("0")
                .takes_value(true),
        )
    }
}
