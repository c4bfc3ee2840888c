//! Diabetes Risk Prediction CLI
//!
//! Collects patient measurements and reports the risk predicted by a
//! pre-trained classifier.

use clap::{Parser, Subcommand};
use diabetes_risk::features::{Answer, FeatureRecord, Sex};
use diabetes_risk::predict::OutputFormat;
use diabetes_risk::{Config, Result, RiskError};

#[derive(Parser)]
#[command(name = "diabetes-risk")]
#[command(version, about = "Diabetes risk prediction from a pre-trained classifier", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enter patient measurements interactively (default)
    Form,
    /// Predict from measurements given on the command line
    Predict {
        /// Age in years [1, 110]
        #[arg(long)]
        age: u32,
        /// male or female
        #[arg(long)]
        sex: Sex,
        /// Body mass index [10, 70]
        #[arg(long)]
        bmi: f64,
        /// Waist circumference in cm [40, 150]
        #[arg(long)]
        waist: u32,
        /// Fasting blood glucose in mg/dL [0, 300]
        #[arg(long)]
        glucose: u32,
        /// HbA1c in percent [0, 15]
        #[arg(long)]
        hba1c: f64,
        /// Family history of diabetes: yes or no
        #[arg(long, default_value = "no")]
        family_history: Answer,
        /// Previous gestational diabetes: yes or no
        #[arg(long, default_value = "no")]
        gestational_diabetes: Answer,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Write a default config file
    Init,
    /// Show information about this application
    About,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command.unwrap_or(Commands::Form) {
        Commands::Form => commands::run_form(&config),
        Commands::Predict {
            age,
            sex,
            bmi,
            waist,
            glucose,
            hba1c,
            family_history,
            gestational_diabetes,
            format,
        } => {
            let record = FeatureRecord {
                age,
                sex,
                bmi,
                waist_circumference: waist,
                fasting_blood_glucose: glucose,
                hba1c,
                family_history,
                gestational_diabetes,
            };
            commands::predict(&config, record, format)
        }
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
        Commands::About => commands::about(),
    };

    if let Err(e) = result {
        match e {
            RiskError::ModelUnavailable { .. } => {
                eprintln!("Fatal: {}", e);
                eprintln!("Make sure the model file exists, or set [model] path in the config.");
            }
            other => eprintln!("Error: {}", other),
        }
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use diabetes_risk::features::FEATURE_NAMES;
    use diabetes_risk::form;
    use diabetes_risk::model::{load_classifier, Classifier};
    use diabetes_risk::predict::{render, Predictor};

    pub fn run_form(config: &Config) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        form::serve(&config.model, stdin.lock(), stdout.lock())?;
        Ok(())
    }

    pub fn predict(config: &Config, record: FeatureRecord, format: OutputFormat) -> Result<()> {
        let predictor = Predictor::new(load_classifier(&config.model)?);
        record.validate()?;

        let prediction = predictor.predict(&record)?;
        println!("{}", render(format, &record, &prediction)?);
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let classifier = load_classifier(&config.model)?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Name:     {}", classifier.name());
        println!("  Kind:     {}", config.model.kind);
        println!("  Path:     {}", config.model.path);
        println!("  Features:");
        for (idx, name) in FEATURE_NAMES.iter().enumerate() {
            println!("    {}. {}", idx + 1, name);
        }

        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!("  1. Place the model file at {}", config.model.path);
        println!("  2. Run 'diabetes-risk' to open the form");

        Ok(())
    }

    pub fn about() -> Result<()> {
        println!("{} v{}", form::TITLE, env!("CARGO_PKG_VERSION"));
        println!("{}", form::DISCLAIMER);
        Ok(())
    }
}
