// SPDX-License-Identifier: MPL-2.0
use nano_layer::app::{App, Flags};
use nano_layer::domain::SelectionRect;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "NANO_LAYER_LOG";

const HELP: &str = "\
nano_layer - layered image editing with generative models

USAGE:
  nano_layer [OPTIONS] <COMMAND> ...

COMMANDS:
  compose <OUT> <IMAGE>...        Stack images as layers and export the result
  generate --out <FILE> <PROMPT>  Create an image, or edit --base
      --base <FILE>               Image to edit
      --ref <FILE>                Reference image (repeatable)
      --select <X,Y,W,H>          Selection in canvas pixels
      --crop                      Send only the selected area
                                  With --aspect or --resolution the result keeps
                                  its own size and is clipped to the canvas
  analyze <IMAGE> <PROMPT>        Ask a question about an image
  history [--page <N>]            List past generations, newest first
  restore --out <FILE> <ID>       Export a past generation

OPTIONS:
  --lang <LOCALE>         Interface language (en-US, zh-CN)
  --config-dir <DIR>      Directory holding settings.toml
  --data-dir <DIR>        Directory for session state and history
  --model <ID>            e.g. fal-ai/nano-banana-pro, gemini-2.5-flash-image
  --aspect <RATIO>        1:1, 3:4, 4:3, 9:16, 16:9
  --resolution <TIER>     1K, 2K, 4K (pro models only)
  --style <TEXT>          Style / system instruction
  -h, --help              Print this help
";

enum Command {
    Compose {
        out: PathBuf,
        images: Vec<PathBuf>,
    },
    Generate {
        out: PathBuf,
        base: Option<PathBuf>,
        references: Vec<PathBuf>,
        selection: Option<SelectionRect>,
        prompt: String,
    },
    Analyze {
        image: PathBuf,
        prompt: String,
    },
    History {
        page: usize,
    },
    Restore {
        out: PathBuf,
        id: u64,
    },
}

fn parse_selection(value: &str) -> Result<SelectionRect, String> {
    let numbers: Vec<f32> = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid selection '{value}': {e}"))?;
    match numbers.as_slice() {
        [x, y, w, h] => Ok(SelectionRect::new(*x, *y, *w, *h)),
        _ => Err(format!("selection needs X,Y,W,H, got '{value}'")),
    }
}

fn rest_as_text(args: pico_args::Arguments) -> String {
    args.finish()
        .into_iter()
        .filter_map(|s| s.into_string().ok())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_args() -> Result<Option<(Flags, Command)>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let flags = Flags {
        lang: args.opt_value_from_str("--lang")?,
        data_dir: args.opt_value_from_str("--data-dir")?,
        config_dir: args.opt_value_from_str("--config-dir")?,
        model: args.opt_value_from_str("--model")?,
        aspect_ratio: args.opt_value_from_str("--aspect")?,
        resolution: args.opt_value_from_str("--resolution")?,
        style_instruction: args.opt_value_from_str("--style")?,
        crop_to_selection: args.contains("--crop"),
    };

    let Some(name) = args.subcommand()? else {
        return Ok(None);
    };
    let command = match name.as_str() {
        "compose" => {
            let out = args.free_from_str()?;
            let images = args
                .finish()
                .into_iter()
                .map(PathBuf::from)
                .collect();
            Command::Compose { out, images }
        }
        "generate" => Command::Generate {
            out: args.value_from_str("--out")?,
            base: args.opt_value_from_str("--base")?,
            references: args.values_from_str("--ref")?,
            selection: args.opt_value_from_fn("--select", parse_selection)?,
            prompt: rest_as_text(args),
        },
        "analyze" => {
            let image = args.free_from_str()?;
            Command::Analyze {
                image,
                prompt: rest_as_text(args),
            }
        }
        "history" => Command::History {
            page: args.opt_value_from_str("--page")?.unwrap_or(1),
        },
        "restore" => {
            let out = args.value_from_str("--out")?;
            Command::Restore {
                out,
                id: args.free_from_str()?,
            }
        }
        other => {
            return Err(pico_args::Error::ArgumentParsingFailed {
                cause: format!("unknown command '{other}'"),
            })
        }
    };
    Ok(Some((flags, command)))
}

async fn run(app: &mut App, command: Command) -> bool {
    match command {
        Command::Compose { out, images } => {
            let mut pasted = 0;
            for image in &images {
                if app.paste_file(image).is_some() {
                    pasted += 1;
                }
            }
            pasted > 0 && app.export_to(&out)
        }
        Command::Generate {
            out,
            base,
            references,
            selection,
            prompt,
        } => {
            if let Some(base) = &base {
                if !app.open_document(base) {
                    return false;
                }
            }
            let target = app.editor().active_layer_id();
            for reference in &references {
                app.add_reference(reference);
            }
            if !references.is_empty() {
                app.select_layer(target);
            }
            if selection.is_some() {
                app.set_selection(selection);
            }
            app.generate(&prompt).await.is_some() && app.export_to(&out)
        }
        Command::Analyze { image, prompt } => {
            if !app.open_document(&image) {
                return false;
            }
            match app.analyze(&prompt).await {
                Some(text) => {
                    println!("{text}");
                    true
                }
                None => false,
            }
        }
        Command::History { page } => {
            let Some(page) = app.history_page(page) else {
                return false;
            };
            for record in &page.records {
                let cost = record
                    .cost
                    .map_or_else(|| "-".to_string(), |c| format!("${c:.4}"));
                println!(
                    "#{:<5} {}  {:<32} {:>8}  {}x{}  {}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.model,
                    cost,
                    record.width,
                    record.height,
                    record.prompt
                );
            }
            println!(
                "page {}/{} ({} total)",
                page.page,
                page.page_count().max(1),
                page.total
            );
            true
        }
        Command::Restore { out, id } => app.restore_history(id).is_some() && app.export_to(&out),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (flags, command) = match parse_args() {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print!("{HELP}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}\n\n{HELP}");
            return ExitCode::from(2);
        }
    };

    let mut app = App::new(&flags);
    let ok = run(&mut app, command).await;
    for line in app.take_messages() {
        eprintln!("{line}");
    }
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parses_four_numbers() {
        let selection = parse_selection("10, 20,30.5,40").unwrap();
        assert_eq!(selection, SelectionRect::new(10.0, 20.0, 30.5, 40.0));
        assert!(parse_selection("1,2,3").is_err());
        assert!(parse_selection("a,b,c,d").is_err());
    }

    #[test]
    fn help_documents_required_analysis_prompt_and_clipping() {
        assert!(HELP.contains("analyze <IMAGE> <PROMPT>"));
        assert!(HELP.contains("clipped to the canvas"));
    }
}
