//! Postloom CLI - Bridge interface for the host application
//!
//! Commands: analyze, templates, render
//! Outputs JSON to stdout
//! Returns non-zero on pipeline failure

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use base64::Engine as _;
use postloom_core::{
    render_template_slide,
    store::{check_engine_version, export_template, TemplateStore},
    AnalysisPipeline, AnalyzeRequest, Template,
};

#[derive(Parser)]
#[command(name = "postloom-cli")]
#[command(about = "Postloom CLI - competitor post analysis & template re-synthesis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding persisted template JSON files
    #[arg(short, long, default_value = "templates")]
    templates_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a competitor post screenshot and synthesize a template
    Analyze {
        /// JSON payload (AnalyzeRequest)
        #[arg(short, long)]
        payload: String,

        /// Source image file; overrides the payload's imageBase64
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Persist the synthesized template to the templates directory
        #[arg(long)]
        save: bool,

        /// Also write the single-file download export
        #[arg(long)]
        export: bool,
    },

    /// List persisted templates
    Templates,

    /// Render one slide of a persisted template to a visual tree
    Render {
        /// Template ID
        #[arg(short = 'i', long)]
        template: String,

        /// Slide number
        #[arg(short, long, default_value_t = 1)]
        slide: u32,

        /// Place the brand logo
        #[arg(long)]
        add_logo: bool,
    },
}

fn fail(error: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "success": false, "error": error.to_string() })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { payload, image, save, export } => {
            let request: AnalyzeRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => {
                    println!("{}", fail(format!("Invalid payload: {e}")));
                    return ExitCode::FAILURE;
                }
            };

            let bytes = match read_image_bytes(&request, image.as_deref()) {
                Ok(b) => b,
                Err(msg) => {
                    println!("{}", fail(msg));
                    return ExitCode::FAILURE;
                }
            };

            let pipeline = AnalysisPipeline::with_builtin_ports();
            match pipeline
                .analyze_and_synthesize(
                    &bytes,
                    &request.brand,
                    Some(&request.content),
                    request.cover_image_url.clone(),
                )
                .await
            {
                Ok(template) => {
                    if save {
                        if let Err(e) = persist(&cli.templates_dir, &template) {
                            println!("{}", fail(e));
                            return ExitCode::FAILURE;
                        }
                    }
                    if export {
                        if let Err(e) = export_template(&cli.templates_dir, &template) {
                            println!("{}", fail(e));
                            return ExitCode::FAILURE;
                        }
                    }
                    let output = serde_json::json!({
                        "success": true,
                        "template": template,
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                        "userMessage": e.user_message(),
                    });
                    println!("{}", serde_json::to_string(&output).unwrap());
                    ExitCode::from(2) // Pipeline failure
                }
            }
        }

        Commands::Templates => match TemplateStore::load_from_dir(&cli.templates_dir) {
            Ok(store) => {
                let templates: Vec<_> = store
                    .list()
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "id": t.id,
                            "name": t.name,
                            "version": t.template_version,
                            "createdAt": t.created_at,
                            "fingerprint": t.fingerprint,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&templates).unwrap());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", fail(format!("Failed to load templates: {e}")));
                ExitCode::FAILURE
            }
        },

        Commands::Render { template, slide, add_logo } => {
            let store = match TemplateStore::load_from_dir(&cli.templates_dir) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}", fail(format!("Failed to load templates: {e}")));
                    return ExitCode::FAILURE;
                }
            };

            let Some(found) = store.get(&template) else {
                println!("{}", fail(format!("Template not found: {template}")));
                return ExitCode::from(2);
            };
            if let Err(e) = check_engine_version(found) {
                println!("{}", fail(e));
                return ExitCode::from(2);
            }
            let Some(target) = found.slides.iter().find(|s| s.slide_number == slide) else {
                println!("{}", fail(format!("No slide {slide} in template")));
                return ExitCode::from(2);
            };

            let tree = render_template_slide(found, target, add_logo);
            println!("{}", serde_json::to_string_pretty(&tree).unwrap());
            ExitCode::SUCCESS
        }
    }
}

fn read_image_bytes(
    request: &AnalyzeRequest,
    image: Option<&std::path::Path>,
) -> Result<Vec<u8>, String> {
    if let Some(path) = image {
        return std::fs::read(path).map_err(|e| format!("Failed to read image: {e}"));
    }
    let Some(encoded) = &request.image_base64 else {
        return Err("No image given: pass --image or imageBase64".to_string());
    };
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| format!("Invalid imageBase64: {e}"))
}

fn persist(dir: &std::path::Path, template: &Template) -> Result<(), String> {
    let mut store = TemplateStore::new();
    store.save(dir, template).map_err(|e| e.to_string())
}
