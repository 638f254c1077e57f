//! Download labeled words, train the category classifier and classify sample words.

use std::path::PathBuf;

use studyml::config::{self, StudymlConfig};
use studyml::{classifier, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init("words") {
        eprintln!("Logging disabled: {err}");
    }
    let mut config = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    let settings = &mut config.classifier;
    if let Some(data) = options.data {
        settings.data_file = data;
    }
    if let Some(model) = options.model {
        settings.model_file = model;
    }
    if let Some(categories) = options.categories {
        settings.categories_file = categories;
    }
    if let Some(path) = options.write_config {
        return write_config(&config, path);
    }

    let predictions =
        classifier::run(&config.classifier, options.retrain).map_err(|err| err.to_string())?;
    for prediction in &predictions {
        println!("{}", classifier::format_prediction(prediction));
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
    categories: Option<PathBuf>,
    write_config: Option<PathBuf>,
    retrain: bool,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => return Err(help_text()),
            "--retrain" => options.retrain = true,
            "--config" | "--data" | "--model" | "--categories" | "--write-config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .map(PathBuf::from)
                    .ok_or_else(|| format!("{flag} requires a value"))?;
                match flag {
                    "--config" => options.config = Some(value),
                    "--data" => options.data = Some(value),
                    "--model" => options.model = Some(value),
                    "--categories" => options.categories = Some(value),
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
        "studyml-words",
        "",
        "Fetch words per category, train the classifier once and classify sample words.",
        "",
        "Usage:",
        "  studyml-words [--config <file>] [--data <csv>] [--model <zip>] [--categories <txt>] [--retrain]",
        "",
        "Options:",
        "  --config <file>        Read settings from this TOML file.",
        "  --data <csv>           Word file (Category,Word); downloaded when missing.",
        "  --model <zip>          Artifact path; reused when present.",
        "  --categories <txt>     Category list separated by \", \".",
        "  --retrain              Train even if the artifact already exists.",
        "  --write-config <file>  Write the effective settings as TOML and exit.",
        "  -h, --help             Show this help.",
    ]
    .join("\n")
}
