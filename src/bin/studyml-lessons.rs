//! Train the lesson recommender and print scores for the configured pairs.

use std::path::PathBuf;

use studyml::config::{self, StudymlConfig};
use studyml::{logging, recommender};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init("lessons") {
        eprintln!("Logging disabled: {err}");
    }
    let mut config = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(data) = options.data {
        config.recommender.data_file = data;
    }
    if let Some(model) = options.model {
        config.recommender.model_file = model;
    }
    if let Some(path) = options.write_config {
        return write_config(&config, path);
    }

    let scores = recommender::run(&config.recommender).map_err(|err| err.to_string())?;
    for score in &scores {
        println!("{}", recommender::format_score(score));
    }
    Ok(())
}

fn write_config(config: &StudymlConfig, path: PathBuf) -> Result<(), String> {
    config::save_to_path(config, &path).map_err(|err| err.to_string())?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[derive(Default)]
struct CliOptions {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    model: Option<PathBuf>,
    write_config: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "--config" | "--data" | "--model" | "--write-config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .map(PathBuf::from)
                    .ok_or_else(|| format!("{flag} requires a value"))?;
                match flag {
                    "--config" => options.config = Some(value),
                    "--data" => options.data = Some(value),
                    "--model" => options.model = Some(value),
                    _ => options.write_config = Some(value),
                }
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "studyml-lessons",
        "",
        "Train the lesson recommender and score the configured (user, lesson) pairs.",
        "",
        "Usage:",
        "  studyml-lessons [--config <file>] [--data <csv>] [--model <zip>]",
        "",
        "Options:",
        "  --config <file>        Read settings from this TOML file.",
        "  --data <csv>           Interaction file (UserId,LessonId,Label).",
        "  --model <zip>          Artifact path written after training.",
        "  --write-config <file>  Write the effective settings as TOML and exit.",
        "  -h, --help             Show this help.",
    ]
    .join("\n")
}
