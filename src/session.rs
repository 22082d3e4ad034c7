//! Interactive, line-oriented session driving a [`Workflow`].
//!
//! The operator types one command per line (see [`HELP`]). Errors are
//! printed and the session carries on; the workflow is never left half
//! updated because every [`Workflow`] operation is all-or-nothing.
//!
//! ```text
//! > script ./episode-12.txt
//! > extract
//! > filter variety on
//! > search
//! > select 1 video
//! > toggle 2 photo 1234567
//! > csv ./out/shotlist.csv
//! > zip ./out/shotlist.zip
//! ```

use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::bundle::ContentFetcher;
use crate::error::Result;
use crate::export;
use crate::filters::Collection;
use crate::gateway::MediaGateway;
use crate::llm::TextModel;
use crate::models::MediaKind;
use crate::progress::ProgressReporter;
use crate::workflow::Workflow;

pub const HELP: &str = "\
commands:
  script <path>                  load the script from a file
  script                         paste the script; end with a line containing only '.'
  extract                        extract the people mentioned in the script
  people                         list extracted people
  filters                        show collection filters
  filter <collection> on|off     restrict search to a collection (e.g. variety, WWD)
  augment on|off                 append the phrase marker to every search
  search                         search videos and photos for every person
  results                        list results ([x] = selected)
  toggle <person#> <kind> <id>   select or unselect one result
  select <person#> <kind>        select every <kind> result for a person
  deselect <person#> <kind>      unselect every <kind> result for a person
  select-all <kind>              select every <kind> result for everyone
  deselect-all <kind>            unselect every <kind> result for everyone
  selected                       list the selection
  csv [path]                     export the selection as CSV (stdout without a path)
  zip <path>                     download the selection into a ZIP archive
  step                           show the current step
  reset                          start over
  help                           show this help
  quit                           leave the session
kinds: video, photo";

/// Collaborators a session needs.
pub struct Services<'a> {
    pub model: &'a dyn TextModel,
    pub gateway: &'a dyn MediaGateway,
    pub fetcher: &'a dyn ContentFetcher,
    pub progress: &'a dyn ProgressReporter,
    pub concurrency: usize,
}

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ScriptFile(PathBuf),
    ScriptPaste,
    Extract,
    People,
    Filters,
    Filter(Collection, bool),
    Augment(bool),
    Search,
    Results,
    Toggle(usize, MediaKind, String),
    Select(usize, MediaKind),
    Deselect(usize, MediaKind),
    SelectAll(MediaKind),
    DeselectAll(MediaKind),
    Selected,
    Csv(Option<PathBuf>),
    Zip(PathBuf),
    Step,
    Reset,
    Help,
    Quit,
}

fn parse_switch(s: Option<&str>) -> std::result::Result<bool, String> {
    match s {
        Some("on") | Some("true") | Some("yes") => Ok(true),
        Some("off") | Some("false") | Some("no") => Ok(false),
        _ => Err("expected on or off".to_string()),
    }
}

fn parse_kind(s: Option<&str>) -> std::result::Result<MediaKind, String> {
    let s = s.ok_or("missing kind (video or photo)")?;
    MediaKind::parse(s).ok_or_else(|| format!("unknown kind '{}' (video or photo)", s))
}

// Person numbers are 1-based on screen.
fn parse_person(s: Option<&str>) -> std::result::Result<usize, String> {
    let s = s.ok_or("missing person number")?;
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("invalid person number '{}'", s)),
    }
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err("empty command".to_string());
        };

        let cmd = match verb {
            "script" => match parts.next() {
                Some(_) => {
                    let rest = line.trim_start()["script".len()..].trim();
                    Command::ScriptFile(PathBuf::from(rest))
                }
                None => Command::ScriptPaste,
            },
            "extract" => Command::Extract,
            "people" => Command::People,
            "filters" => Command::Filters,
            "filter" => {
                let name = parts.next().ok_or("missing collection name")?;
                let collection = Collection::parse(name)
                    .ok_or_else(|| format!("unknown collection '{}'", name))?;
                Command::Filter(collection, parse_switch(parts.next())?)
            }
            "augment" => Command::Augment(parse_switch(parts.next())?),
            "search" => Command::Search,
            "results" => Command::Results,
            "toggle" => {
                let person = parse_person(parts.next())?;
                let kind = parse_kind(parts.next())?;
                let id = parts.next().ok_or("missing media id")?;
                Command::Toggle(person, kind, id.to_string())
            }
            "select" => Command::Select(parse_person(parts.next())?, parse_kind(parts.next())?),
            "deselect" => {
                Command::Deselect(parse_person(parts.next())?, parse_kind(parts.next())?)
            }
            "select-all" => Command::SelectAll(parse_kind(parts.next())?),
            "deselect-all" => Command::DeselectAll(parse_kind(parts.next())?),
            "selected" => Command::Selected,
            "csv" => Command::Csv(parts.next().map(PathBuf::from)),
            "zip" => Command::Zip(PathBuf::from(parts.next().ok_or("missing output path")?)),
            "step" => Command::Step,
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}' (try 'help')", other)),
        };
        Ok(cmd)
    }
}

/// Whether the session should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs one command against the workflow, writing output to `out`.
pub async fn execute<W: Write>(
    command: Command,
    workflow: &mut Workflow,
    services: &Services<'_>,
    out: &mut W,
) -> Result<Flow> {
    match command {
        Command::ScriptFile(path) => {
            let text = std::fs::read_to_string(&path)?;
            workflow.submit_script(&text)?;
            writeln!(out, "loaded script ({} characters)", text.chars().count())?;
        }
        // Collected by `run_session` before reaching here.
        Command::ScriptPaste => {}
        Command::Extract => {
            let people = workflow.generate_shotlist(services.model).await?;
            writeln!(out, "found {} people", people.len())?;
            print_people(workflow, out)?;
        }
        Command::People => print_people(workflow, out)?,
        Command::Filters => print_filters(workflow, out)?,
        Command::Filter(collection, enabled) => {
            let mut filter = workflow.filter().clone();
            filter.set(collection, enabled);
            workflow.configure_filters(filter)?;
            print_filters(workflow, out)?;
        }
        Command::Augment(enabled) => {
            let mut filter = workflow.filter().clone();
            filter.phrase_augmentation = enabled;
            workflow.configure_filters(filter)?;
            print_filters(workflow, out)?;
        }
        Command::Search => {
            let results = workflow.search(services.gateway, services.progress).await?;
            let videos: usize = results.iter().map(|r| r.videos.len()).sum();
            let photos: usize = results.iter().map(|r| r.photos.len()).sum();
            writeln!(
                out,
                "searched {} people: {} videos, {} photos",
                results.len(),
                videos,
                photos
            )?;
        }
        Command::Results => print_results(workflow, out)?,
        Command::Toggle(person, kind, id) => {
            let selected = workflow.toggle(person, kind, &id)?;
            writeln!(
                out,
                "{} {} {}",
                if selected { "selected" } else { "unselected" },
                kind,
                id
            )?;
        }
        Command::Select(person, kind) => {
            let n = workflow.select_all_of_kind(person, kind)?;
            writeln!(out, "selected {} {}s for person {}", n, kind, person + 1)?;
        }
        Command::Deselect(person, kind) => {
            workflow.deselect_all_of_kind(person, kind)?;
            writeln!(out, "unselected {}s for person {}", kind, person + 1)?;
        }
        Command::SelectAll(kind) => {
            let n = workflow.select_all_global(kind)?;
            writeln!(out, "selected {} {}s", n, kind)?;
        }
        Command::DeselectAll(kind) => {
            workflow.deselect_all_global(kind)?;
            writeln!(out, "unselected all {}s", kind)?;
        }
        Command::Selected => {
            let selections = workflow.selections();
            if selections.is_empty() {
                writeln!(out, "nothing selected")?;
            }
            for s in selections {
                writeln!(
                    out,
                    "  #{} {}  {} {}  {}",
                    s.entity_index + 1,
                    s.entity_name,
                    s.kind,
                    s.media_id,
                    s.file_name
                )?;
            }
        }
        Command::Csv(path) => {
            let csv = workflow.compile_export()?;
            match path {
                Some(path) => {
                    export::write_export(csv, Some(&path))?;
                    writeln!(
                        out,
                        "wrote {} rows to {}",
                        export::row_count(csv),
                        path.display()
                    )?;
                }
                None => write!(out, "{}", csv)?,
            }
        }
        Command::Zip(path) => {
            let bundle = workflow
                .package_bundle(services.fetcher, services.concurrency, services.progress)
                .await?;
            bundle.write_to(&path)?;
            writeln!(
                out,
                "wrote {} files to {} ({} failed)",
                bundle.packaged.len(),
                path.display(),
                bundle.failed.len()
            )?;
            for failure in &bundle.failed {
                writeln!(out, "  skipped {}", failure)?;
            }
        }
        Command::Step => writeln!(out, "step {}", workflow.step())?,
        Command::Reset => {
            workflow.reset();
            writeln!(out, "reset; back to step {}", workflow.step())?;
        }
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn print_people<W: Write>(workflow: &Workflow, out: &mut W) -> Result<()> {
    if workflow.people().is_empty() {
        writeln!(out, "no people yet (run 'extract')")?;
    }
    for (i, person) in workflow.people().iter().enumerate() {
        writeln!(out, "  {}. {}  [{}]", i + 1, person.name, person.search_term)?;
    }
    Ok(())
}

fn print_filters<W: Write>(workflow: &Workflow, out: &mut W) -> Result<()> {
    let filter = workflow.filter();
    for collection in Collection::ALL {
        writeln!(
            out,
            "  [{}] {:<14} {:<4} ({})",
            if filter.is_enabled(collection) { "x" } else { " " },
            collection.key(),
            collection.code(),
            collection.display_name()
        )?;
    }
    writeln!(
        out,
        "  phrase augmentation: {}",
        if filter.phrase_augmentation { "on" } else { "off" }
    )?;
    Ok(())
}

fn print_results<W: Write>(workflow: &Workflow, out: &mut W) -> Result<()> {
    if workflow.results().is_empty() {
        writeln!(out, "no results yet (run 'search')")?;
    }
    for (i, result) in workflow.results().iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, result.person.name)?;
        for kind in MediaKind::ALL {
            let items = result.items(kind);
            if items.is_empty() {
                writeln!(out, "   {}: none", kind.plural())?;
                continue;
            }
            writeln!(out, "   {}:", kind.plural())?;
            for media in items {
                writeln!(
                    out,
                    "     [{}] {}  {}",
                    if workflow.is_selected(i, &media.id) { "x" } else { " " },
                    media.id,
                    media.title
                )?;
            }
        }
    }
    Ok(())
}

/// Reads commands from `input` until `quit` or end of input.
pub async fn run_session<R, W>(
    workflow: &mut Workflow,
    services: &Services<'_>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "shotlist session; type 'help' for commands")?;

    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "error: {}", msg)?;
                continue;
            }
        };

        let outcome = if command == Command::ScriptPaste {
            let mut text = String::new();
            while let Some(pasted) = lines.next_line().await? {
                if pasted.trim() == "." {
                    break;
                }
                text.push_str(&pasted);
                text.push('\n');
            }
            workflow.submit_script(&text).map(|_| Flow::Continue)
        } else {
            execute(command, workflow, services, out).await
        };

        match outcome {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => writeln!(out, "error: {}", e)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            Command::parse("toggle 2 photo 12345").unwrap(),
            Command::Toggle(1, MediaKind::Photo, "12345".into())
        );
        assert_eq!(
            Command::parse("select 1 videos").unwrap(),
            Command::Select(0, MediaKind::Video)
        );
        assert_eq!(
            Command::parse("filter variety on").unwrap(),
            Command::Filter(Collection::Variety, true)
        );
        assert_eq!(Command::parse("augment off").unwrap(), Command::Augment(false));
        assert_eq!(Command::parse("csv").unwrap(), Command::Csv(None));
        assert_eq!(Command::parse("script").unwrap(), Command::ScriptPaste);
        assert_eq!(
            Command::parse("script ./my script.txt").unwrap(),
            Command::ScriptFile(PathBuf::from("./my script.txt"))
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Command::parse("toggle 0 photo 1").is_err());
        assert!(Command::parse("select 1 audio").is_err());
        assert!(Command::parse("filter nowhere on").is_err());
        assert!(Command::parse("augment maybe").is_err());
        assert!(Command::parse("zip").is_err());
        assert!(Command::parse("dance").is_err());
    }
}
