//! Terminal browser over a [`Session`].
//!
//! By default we use `rustyline` for line editing and tab completion.
//! A minimal stdin-based fallback exists behind `--no-default-features`.

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::fs;
use std::io;
use std::io::Read;
#[cfg(not(feature = "repl-rustyline"))]
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use pokedex_client::render::render_screen;
use pokedex_client::{DetailTab, QueryService, Screen, Session};

const PROMPT: &str = "pokedex> ";

const COMMANDS: &[&str] = &[
    "search", "view", "open", "next", "prev", "chain", "tab", "back", "home", "random", "show",
    "help", "exit", "quit",
];

pub(crate) struct BrowseState {
    session: Session,
    service: Box<dyn QueryService>,
}

impl BrowseState {
    pub(crate) fn new(service: Box<dyn QueryService>) -> Result<Self> {
        let mut session = Session::bootstrap(service.as_ref())
            .map_err(|e| anyhow!("failed to load the catalog: {e}"))?;
        session.refresh_landing_picks(&mut rand::thread_rng());
        Ok(Self { session, service })
    }

    fn print_screen(&self) {
        println!("{}\n", render_screen(&self.session.view(), self.session.banner()));
    }
}

pub(crate) fn cmd_browse(state: BrowseState) -> Result<()> {
    #[cfg(feature = "repl-rustyline")]
    {
        return cmd_browse_rustyline(state);
    }
    #[cfg(not(feature = "repl-rustyline"))]
    {
        return cmd_browse_simple(state);
    }
}

pub(crate) fn cmd_browse_script(
    mut state: BrowseState,
    script: Option<&PathBuf>,
    commands: &[String],
    continue_on_error: bool,
    quiet: bool,
) -> Result<()> {
    let mut lines: Vec<String> = Vec::new();

    if let Some(script_path) = script {
        let text = if script_path.as_os_str() == "-" {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            fs::read_to_string(script_path)
                .map_err(|e| anyhow!("failed to read {}: {e}", script_path.display()))?
        };
        lines.extend(text.lines().map(str::to_string));
    }
    lines.extend(commands.iter().cloned());

    for (idx, raw_line) in lines.iter().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if !quiet {
            println!("{PROMPT}{line}");
        }

        match dispatch_line(&mut state, line) {
            Ok(BrowseControl::Continue) => {}
            Ok(BrowseControl::Exit) => break,
            Err(e) => {
                if continue_on_error {
                    eprintln!("{} {e}", "error:".red().bold());
                } else {
                    return Err(anyhow!("browse script failed at line {}: {e}", idx + 1));
                }
            }
        }
    }

    Ok(())
}

fn print_welcome(state: &BrowseState) {
    println!("{}", "Pokédex".green().bold());
    println!("Type `help` for commands. Type `exit` to quit.\n");
    state.print_screen();
}

#[cfg(not(feature = "repl-rustyline"))]
fn cmd_browse_simple(mut state: BrowseState) -> Result<()> {
    print_welcome(&state);

    let stdin = io::stdin();
    loop {
        print!("{}", PROMPT.cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match dispatch_line(&mut state, line) {
            Ok(BrowseControl::Continue) => {}
            Ok(BrowseControl::Exit) => break,
            Err(e) => eprintln!("{} {e}", "error:".red().bold()),
        }
    }

    Ok(())
}

#[cfg(feature = "repl-rustyline")]
fn cmd_browse_rustyline(mut state: BrowseState) -> Result<()> {
    use rustyline::error::ReadlineError;
    use rustyline::Editor;

    print_welcome(&state);

    let mut rl: Editor<BrowseHelper, rustyline::history::DefaultHistory> =
        Editor::new().map_err(|e| anyhow!("failed to init rustyline: {e}"))?;
    rl.set_helper(Some(BrowseHelper));

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => continue,
            Err(e) => return Err(anyhow!("readline error: {e}")),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        rl.add_history_entry(line)
            .map_err(|e| anyhow!("failed to record history: {e}"))?;

        match dispatch_line(&mut state, line) {
            Ok(BrowseControl::Continue) => {}
            Ok(BrowseControl::Exit) => break,
            Err(e) => eprintln!("{} {e}", "error:".red().bold()),
        }
    }

    Ok(())
}

#[cfg(feature = "repl-rustyline")]
struct BrowseHelper;

#[cfg(feature = "repl-rustyline")]
impl rustyline::Helper for BrowseHelper {}

#[cfg(feature = "repl-rustyline")]
impl rustyline::highlight::Highlighter for BrowseHelper {}

#[cfg(feature = "repl-rustyline")]
impl rustyline::hint::Hinter for BrowseHelper {
    type Hint = String;
    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

#[cfg(feature = "repl-rustyline")]
impl rustyline::validate::Validator for BrowseHelper {}

#[cfg(feature = "repl-rustyline")]
impl rustyline::completion::Completer for BrowseHelper {
    type Candidate = rustyline::completion::Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let start = line[..pos]
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &line[start..pos];
        let head = line[..start].trim();

        let items: &[&str] = match head {
            "" => COMMANDS,
            "tab" => &["general", "more-info"],
            _ => &[],
        };
        let pairs = items
            .iter()
            .filter(|item| item.starts_with(word))
            .map(|item| rustyline::completion::Pair {
                display: item.to_string(),
                replacement: item.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

enum BrowseControl {
    Continue,
    Exit,
}

fn dispatch_line(state: &mut BrowseState, line: &str) -> Result<BrowseControl> {
    let now = Instant::now();
    if state.session.tick(now) {
        state.session.refresh_landing_picks(&mut rand::thread_rng());
    }

    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "help" | "?" => {
            print_help();
            return Ok(BrowseControl::Continue);
        }
        "exit" | "quit" => return Ok(BrowseControl::Exit),
        "search" | "s" => {
            if rest.is_empty() {
                return Err(anyhow!("usage: search <name or id>"));
            }
            state.session.run_search(state.service.as_ref(), rest, now);
        }
        "view" | "v" => {
            let n = one_index_arg("view", rest)?;
            match state.session.screen() {
                Screen::Landing => state.session.select_random(n)?,
                Screen::SearchResults => state.session.select_result(n)?,
                Screen::Detail { .. } => {
                    return Err(anyhow!("`view` picks from a list; use `chain <id>` on a detail screen"))
                }
            };
        }
        "open" | "o" => {
            let id = id_arg("open", rest)?;
            state.session.open(id);
        }
        "next" | "n" => {
            state.session.next()?;
        }
        "prev" | "previous" | "p" => {
            state.session.previous()?;
        }
        "chain" => {
            let id = id_arg("chain", rest)?;
            state.session.select_chain_member(id)?;
        }
        "tab" | "t" => {
            if rest.is_empty() {
                state.session.cycle_tab()?;
            } else {
                let tab = DetailTab::parse(rest)
                    .ok_or_else(|| anyhow!("unknown tab `{rest}` (expected general|more-info)"))?;
                if state.session.screen().detail_id().is_none() {
                    return Err(anyhow!("`tab` needs a detail screen"));
                }
                state.session.set_tab(tab);
            }
        }
        "back" | "b" => state.session.back(),
        "home" | "h" => {
            state.session.home();
            state.session.refresh_landing_picks(&mut rand::thread_rng());
        }
        "random" | "r" => {
            state.session.home();
            refresh_picks_from_service(state, now);
        }
        "show" => {}
        other => return Err(anyhow!("unknown command `{other}` (try `help`)")),
    }

    if state.session.screen() == Screen::Landing && state.session.landing_picks().is_empty() {
        state.session.refresh_landing_picks(&mut rand::thread_rng());
    }
    state.print_screen();
    Ok(BrowseControl::Continue)
}

/// Draw landing picks through the query service. On failure the banner goes
/// up and the picks come from the local cache.
fn refresh_picks_from_service(state: &mut BrowseState, now: Instant) {
    match state.service.random(pokedex_client::LANDING_PICKS) {
        Ok(records) => state
            .session
            .set_landing_picks(records.into_iter().map(|r| r.id).collect()),
        Err(e) => {
            tracing::warn!(error = %e, "random picks request failed; using the local cache");
            state.session.raise_error(format!("random picks failed: {e}"), now);
            state.session.refresh_landing_picks(&mut rand::thread_rng());
        }
    }
}

fn one_index_arg(cmd: &str, rest: &str) -> Result<usize> {
    let n: usize = rest
        .parse()
        .map_err(|_| anyhow!("usage: {cmd} <n> (1-based position in the list)"))?;
    n.checked_sub(1)
        .ok_or_else(|| anyhow!("positions start at 1"))
}

fn id_arg(cmd: &str, rest: &str) -> Result<u32> {
    rest.trim_start_matches('#')
        .parse()
        .map_err(|_| anyhow!("usage: {cmd} <id>"))
}

fn print_help() {
    println!("{}", "Commands".bold());
    println!("  search <q>       find by name substring or exact id");
    println!("  view <n>         open entry n of the current list (results or random picks)");
    println!("  open <id>        open a record by id");
    println!("  next | prev      step through ids in order (wraps)");
    println!("  chain <id>       jump to a member of the shown evolution chain");
    println!("  tab [name]       cycle detail tabs, or pick general|more-info");
    println!("  back             previous screen");
    println!("  home             landing screen with fresh random picks");
    println!("  random           new random picks from the service");
    println!("  show             redraw the current screen");
    println!("  help | exit");
}
