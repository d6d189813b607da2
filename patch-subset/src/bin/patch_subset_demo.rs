//! Drives one patch-subset extend cycle against a font on disk, entirely in-process (the
//! "transport" is just an ordinary function call to a locally constructed server).

use clap::Parser;
use log::info;

use patch_subset::binary_diff::SharedBrotliDiff;
use patch_subset::client::{ClientState, PatchSubsetClient};
use patch_subset::codepoint_predictor::NoopCodepointPredictor;
use patch_subset::font_provider::FileFontProvider;
use patch_subset::hasher::Xxh3Hasher;
use patch_subset::request_logger::NullRequestLogger;
use patch_subset::server::PatchSubsetServer;
use patch_subset::subsetter::FakeSubsetter;
use patch_subset::wire;
use patch_subset::CodepointSet;

#[derive(Parser, Debug)]
#[command(version, about = "Run a single patch-subset extend cycle against a font file.")]
struct Args {
    /// The full font file to serve subsets of.
    #[arg(short, long)]
    font: std::path::PathBuf,

    /// The subset bytes produced by the extend cycle are written here.
    #[arg(short, long)]
    output: std::path::PathBuf,

    /// Text to extend the subset to cover.
    #[arg(short, long)]
    text: Option<String>,

    /// Comma separated list of unicode codepoint values (base 10).
    #[arg(short, long, value_delimiter = ',', num_args = 0..)]
    unicodes: Vec<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut codepoints = CodepointSet::empty();
    if let Some(text) = &args.text {
        for c in text.chars() {
            codepoints.insert(c as u32);
        }
    }
    for unicode_string in &args.unicodes {
        let unicode: u32 = unicode_string.parse().expect("bad unicode value");
        codepoints.insert(unicode);
    }

    let font_id = args
        .font
        .file_name()
        .expect("font path must name a file")
        .to_string_lossy()
        .into_owned();
    let base_directory = args
        .font
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    let server = PatchSubsetServer::new(
        Box::new(FileFontProvider::new(base_directory)),
        Box::new(FakeSubsetter),
        Box::new(SharedBrotliDiff),
        Box::new(Xxh3Hasher),
        None,
        Box::new(NoopCodepointPredictor),
        0,
    );

    let mut client = PatchSubsetClient::new(
        Box::new(FakeSubsetter),
        Box::new(SharedBrotliDiff),
        Box::new(Xxh3Hasher),
        Box::new(NullRequestLogger),
    );
    let mut state = ClientState::new(font_id.clone());

    info!("requesting {} codepoints for {}", codepoints.len(), font_id);
    client
        .extend(&codepoints, &mut state, |request_bytes| {
            let request = wire::decode_request(request_bytes)?;
            let response = server.handle(&font_id, &request)?;
            Ok(wire::encode_response(&response))
        })
        .expect("extend cycle failed");

    info!("produced a {}-byte subset", state.font_data.len());
    std::fs::write(&args.output, &state.font_data).expect("writing output subset failed");
    println!("Wrote subset to {}", args.output.display());
}
