//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::cli::output;
use crate::cli::{Cli, DataSourceType, OutputFormat, SourceArgs};
use crate::data_source::{DataSource, create_data_source};
use crate::flow_graph::{FlowGraph, LogStatus, Phase, StatusSink, VertexMap, explore};
use crate::{Config, Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Build the data source selected by `args`, applying CLI overrides to `config`
fn open_data_source(args: SourceArgs, mut config: Config) -> Result<Box<dyn DataSource>> {
    let source = DataSourceType::resolve(args.source, &config)?;
    tracing::debug!("Using data source: {:?}", source);

    if let Some(fixtures) = args.fixtures {
        config.mock.fixtures = Some(fixtures);
    }
    create_data_source(source, &config, args.api_key)
}

/// Run one exploration, racing it against the configured deadline
async fn run_exploration(
    source: &dyn DataSource,
    origin: &str,
    depth: u32,
    status: &mut dyn StatusSink,
    deadline: Option<Duration>,
) -> Result<(VertexMap, FlowGraph)> {
    let Some(deadline) = deadline else {
        return explore(source, origin, depth, status).await;
    };

    let outcome = tokio::time::timeout(deadline, explore(source, origin, depth, &mut *status)).await;
    match outcome {
        Ok(result) => result,
        Err(_) => {
            let err = Error::Timeout(deadline.as_secs());
            status.report_phase(Phase::Error);
            status.report_error(&err.to_string());
            Err(err)
        }
    }
}

/// Render a traced graph to `w`
fn render(
    w: &mut impl std::io::Write,
    format: OutputFormat,
    vertices: &VertexMap,
    graph: &FlowGraph,
) -> Result<()> {
    match format {
        OutputFormat::Json => output::output_json(w, graph),
        OutputFormat::Dot => output::output_dot(w, graph),
        OutputFormat::Table => output::output_table(w, vertices, graph),
        OutputFormat::Export => output::output_export(w, vertices),
    }
}

/// Render to a file when one is given, stdout otherwise
fn render_to(
    path: Option<&Path>,
    format: OutputFormat,
    vertices: &VertexMap,
    graph: &FlowGraph,
) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
            render(&mut file, format, vertices, graph)?;
            file.flush()?;
            tracing::info!("Wrote {:?} output to {:?}", format, path);
            Ok(())
        }
        None => render(&mut std::io::stdout(), format, vertices, graph),
    }
}

/// Trace command implementation
pub mod trace {
    use super::*;
    use crate::cli::Commands;

    /// Execute the trace command
    pub async fn execute(args: Cli, config: Config) -> Result<()> {
        let (address, depth, source_args, output_format, out) = match args.command {
            Commands::Trace {
                address,
                depth,
                source,
                output,
                out,
            } => (address, depth, source, output, out),
            _ => unreachable!("trace::execute called with wrong command"),
        };

        let depth = depth.unwrap_or(config.default.depth);
        crate::ensure!(depth >= 1, "Depth must be at least 1, got {}", depth);

        tracing::info!("Tracing address: {}", address);

        let deadline = config.traversal_timeout();
        let data_source = open_data_source(source_args, config)?;
        let mut status = LogStatus::new();

        let (vertices, graph) =
            run_exploration(data_source.as_ref(), &address, depth, &mut status, deadline).await?;

        // Exports default to a file named after the origin
        let out = match (output_format, out) {
            (_, Some(path)) => Some(path),
            (OutputFormat::Export, None) => Some(PathBuf::from(output::export_file_name(&address))),
            _ => None,
        };

        render_to(out.as_deref(), output_format, &vertices, &graph)
    }
}

/// Inspect command implementation
pub mod inspect {
    use super::*;

    /// Execute the inspect command
    pub fn execute(file: PathBuf, output_format: OutputFormat) -> Result<()> {
        tracing::info!("Loading exported trace from {:?}", file);
        let vertices = output::read_export(&file)?;
        let graph = FlowGraph::build_from_vertices(&vertices);
        render_to(None, output_format, &vertices, &graph)
    }
}

/// Interactive command implementation
pub mod interactive {
    use super::*;
    use crate::cli::Commands;
    use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

    /// One line of user input
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Request {
        Run { address: String, depth: Option<u32> },
        Export { path: Option<PathBuf> },
        Show(OutputFormat),
        Help,
        Quit,
        Empty,
    }

    /// Parse a prompt line
    pub fn parse_request(line: &str) -> Result<Request> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Request::Empty);
        };

        let request = match command {
            "run" | "trace" => {
                let address = words
                    .next()
                    .ok_or_else(|| Error::custom("Oops! Missing parameter(s). Usage: run <address> [depth]"))?
                    .to_string();
                let depth = match words.next() {
                    Some(d) => {
                        let depth: u32 = d
                            .parse()
                            .map_err(|_| Error::custom(format!("Depth must be a number, got {:?}", d)))?;
                        crate::ensure!(depth >= 1, "Depth must be at least 1, got {}", depth);
                        Some(depth)
                    }
                    None => None,
                };
                Request::Run { address, depth }
            }
            "export" => Request::Export {
                path: words.next().map(PathBuf::from),
            },
            "show" => {
                let format = match words.next().unwrap_or("table") {
                    "json" => OutputFormat::Json,
                    "dot" => OutputFormat::Dot,
                    "table" => OutputFormat::Table,
                    other => crate::bail!("Unknown format {:?}; use table, json or dot", other),
                };
                Request::Show(format)
            }
            "help" | "?" => Request::Help,
            "quit" | "exit" | "q" => Request::Quit,
            other => crate::bail!("Unknown command {:?}; type help", other),
        };

        if let Some(extra) = words.next() {
            crate::bail!("Unexpected argument {:?}", extra);
        }
        Ok(request)
    }

    const HELP: &str = "\
Commands:
  run <address> [depth]   trace fund flows from an address
  show [table|json|dot]   print the current graph
  export [path]           save the current trace as JSON
  help                    show this message
  quit                    leave";

    struct Session {
        origin: String,
        vertices: VertexMap,
        graph: FlowGraph,
    }

    /// Show an error for `interval`, counting down, then return to the prompt
    async fn show_error(err: &Error, interval: Duration) {
        let secs = interval.as_secs();
        if secs == 0 {
            println!("{}", err);
            return;
        }
        for remaining in (1..=secs).rev() {
            println!("({}) {}", remaining, err);
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        if err.is_user_input() {
            println!("Check the address and API key, then try again.");
        }
    }

    async fn prompt(lines: &mut Lines<BufReader<Stdin>>, message: &str) -> Result<Option<String>> {
        use std::io::Write;
        print!("{}", message);
        std::io::stdout().flush()?;
        Ok(lines.next_line().await?)
    }

    /// Execute the interactive command
    pub async fn execute(args: Cli, config: Config) -> Result<()> {
        let source_args = match args.command {
            Commands::Interactive { source } => source,
            _ => unreachable!("interactive::execute called with wrong command"),
        };

        let default_depth = config.default.depth;
        let deadline = config.traversal_timeout();
        let error_display = config.error_display();
        let data_source = open_data_source(source_args, config)?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut status = LogStatus::new();
        let mut session: Option<Session> = None;

        println!("{}", HELP);

        loop {
            let Some(line) = prompt(&mut lines, "> ").await? else {
                break;
            };

            let request = match parse_request(&line) {
                Ok(request) => request,
                Err(e) => {
                    show_error(&e, error_display).await;
                    continue;
                }
            };

            match request {
                Request::Empty => {}
                Request::Help => println!("{}", HELP),
                Request::Quit => break,
                Request::Run { address, depth } => {
                    if session.is_some() {
                        let answer =
                            prompt(&mut lines, "Running will reset the graph. Are you sure? [y/N] ")
                                .await?;
                        if !matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes")) {
                            continue;
                        }
                    }

                    let depth = depth.unwrap_or(default_depth);
                    if depth == 0 {
                        show_error(&Error::custom("Depth must be at least 1, got 0"), error_display).await;
                        continue;
                    }
                    match run_exploration(data_source.as_ref(), &address, depth, &mut status, deadline)
                        .await
                    {
                        Ok((vertices, graph)) => {
                            output::output_table(&mut std::io::stdout(), &vertices, &graph)?;
                            session = Some(Session {
                                origin: address,
                                vertices,
                                graph,
                            });
                        }
                        Err(e) => show_error(&e, error_display).await,
                    }
                }
                Request::Show(format) => match &session {
                    Some(s) => render(&mut std::io::stdout(), format, &s.vertices, &s.graph)?,
                    None => {
                        show_error(&Error::custom("There is no graph to show. Run a search first!"), error_display)
                            .await
                    }
                },
                Request::Export { path } => match &session {
                    Some(s) => {
                        let path =
                            path.unwrap_or_else(|| PathBuf::from(output::export_file_name(&s.origin)));
                        match output::write_export(&path, &s.vertices) {
                            Ok(()) => println!("Saved {:?}", path),
                            Err(e) => show_error(&e, error_display).await,
                        }
                    }
                    None => {
                        show_error(
                            &Error::custom("There is no information to save. Run a search first!"),
                            error_display,
                        )
                        .await
                    }
                },
            }
        }

        Ok(())
    }

}
