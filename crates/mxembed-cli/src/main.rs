use std::io::Read;

use mxembed::{DiagramFile, EmbedOptions, render_embed_html};

mod server;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Embed(mxembed::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Embed(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<mxembed::Error> for CliError {
    fn from(value: mxembed::Error) -> Self {
        Self::Embed(value)
    }
}

#[derive(Debug, Default)]
struct Args {
    dark_mode: bool,
    output_short: Option<String>,
    output_long: Option<String>,
    toolbar_short: Option<String>,
    toolbar_long: Option<String>,
    js_url: Option<String>,
    server: bool,
    port: u16,
    input: Option<String>,
}

impl Args {
    // The long form wins when both forms were given on the command line;
    // flags that were never set fall back to the shared defaults.
    fn output(&self) -> Option<&str> {
        self.output_long.as_deref().or(self.output_short.as_deref())
    }

    fn toolbar(&self) -> Option<&str> {
        self.toolbar_long
            .as_deref()
            .or(self.toolbar_short.as_deref())
    }
}

fn usage() -> &'static str {
    "mxembed-cli\n\
\n\
USAGE:\n\
  mxembed-cli [-d|--dark-mode] [-o|--output <path>] [-t|--toolbar <list>] [--js <url>] [<path>|-]\n\
  mxembed-cli --server [--port <n>]\n\
\n\
OPTIONS:\n\
  -d, --dark-mode        Render the viewer in dark mode\n\
  -o, --output <path>    Write the HTML fragment to <path> instead of stdout\n\
  -t, --toolbar <list>   Comma-separated toolbar items (default: pages,zoom,layers,tags)\n\
      --js <url>         Viewer script URL; pass an empty string to omit the <script> tag\n\
      --server           Serve the converter over HTTP instead of converting a file\n\
      --port <n>         Port for --server (default: 8080)\n\
\n\
NOTES:\n\
  - If <path> is '-', input is read from stdin.\n\
  - The long form of a flag wins when both the short and long form are given.\n\
  - The HTTP routes always convert with the default options.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        port: DEFAULT_PORT,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "-d" | "--dark-mode" => args.dark_mode = true,
            "-o" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.output_short = Some(path.clone());
            }
            "--output" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.output_long = Some(path.clone());
            }
            "-t" => {
                let Some(list) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.toolbar_short = Some(list.clone());
            }
            "--toolbar" => {
                let Some(list) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.toolbar_long = Some(list.clone());
            }
            "--js" => {
                let Some(url) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.js_url = Some(url.clone());
            }
            "--server" => args.server = true,
            "--port" => {
                let Some(port) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.port = port.parse::<u16>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                while it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: &str) -> Result<String, CliError> {
    match input {
        "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        path => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn resolve_options(args: &Args) -> EmbedOptions {
    let mut options = EmbedOptions::default();
    if let Some(list) = args.toolbar() {
        options = options.with_toolbar_list(list);
    }
    if let Some(url) = args.js_url.as_deref() {
        options = options.with_script_url(url);
    }
    options.with_dark_mode(args.dark_mode)
}

fn run(args: Args) -> Result<(), CliError> {
    if args.server {
        return server::serve(args.port).map_err(CliError::Io);
    }

    let Some(input) = args.input.as_deref() else {
        return Err(CliError::Usage(usage()));
    };

    let text = read_input(input)?;
    // Well-formedness gate only; the generator embeds the original text.
    DiagramFile::parse(&text)?;
    let html = render_embed_html(&text, &resolve_options(&args))?;
    write_text(&html, args.output())?;
    Ok(())
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
