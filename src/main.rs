use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
mod auth;
use datalock::crypto::kdf::DEFAULT_ITERATIONS;
use datalock::crypto::{self, BlobHeader, TAG_LEN};
use datalock::{
    DEFAULT_BLOB, DEFAULT_INPUT, DEFAULT_VERIFIER, ErrorKind, FileSource, KdfParams,
    Orchestrator, Storage, Unlock, VerifierRecord,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "datalock")]
#[command(
    version,
    about = "Seal a dataset behind a shared password for hosting on untrusted servers."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts the dataset and writes a matching verifier record
    Package {
        /// Plaintext dataset to encrypt
        #[arg(short, long, value_name = "PATH", env = "DATALOCK_INPUT", default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Where to write the encrypted blob
        #[arg(short, long, value_name = "PATH", env = "DATALOCK_BLOB", default_value = DEFAULT_BLOB)]
        output: PathBuf,

        /// Where to write the verifier record
        #[arg(long, value_name = "PATH", env = "DATALOCK_VERIFIER", default_value = DEFAULT_VERIFIER)]
        verifier: PathBuf,

        /// PBKDF2 iterations for both the verifier and the blob key
        #[arg(long, env = "DATALOCK_ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
        iterations: u32,
    },

    /// Checks a password against the verifier record
    Verify {
        /// Verifier record (falls back to DATALOCK_VERIFIER_* variables, then the default path)
        #[arg(long, value_name = "PATH", env = "DATALOCK_VERIFIER")]
        verifier: Option<PathBuf>,
    },

    /// Verifies the password, then decrypts the blob
    Unlock {
        /// Verifier record (falls back to DATALOCK_VERIFIER_* variables, then the default path)
        #[arg(long, value_name = "PATH", env = "DATALOCK_VERIFIER")]
        verifier: Option<PathBuf>,

        /// Encrypted blob to open
        #[arg(long, value_name = "PATH", env = "DATALOCK_BLOB", default_value = DEFAULT_BLOB)]
        blob: PathBuf,

        /// Write the dataset here instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Shows the header of an encrypted blob
    Inspect {
        /// Encrypted blob to inspect
        #[arg(long, value_name = "PATH", env = "DATALOCK_BLOB", default_value = DEFAULT_BLOB)]
        blob: PathBuf,

        /// Also compare against this verifier record's fingerprint
        #[arg(long, value_name = "PATH")]
        verifier: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();

    let args = Cli::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code(&err)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Unable to set global default subscriber");
    }
}

/// 2 for a rejected password, 3 for a blob that fails to open, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    let kind = err
        .chain()
        .find_map(|e| e.downcast_ref::<datalock::Error>())
        .map(datalock::Error::kind);

    match kind {
        Some(ErrorKind::Authentication) => ExitCode::from(2),
        Some(ErrorKind::Integrity) => ExitCode::from(3),
        _ => ExitCode::FAILURE,
    }
}

fn run(args: Cli) -> Result<()> {
    match args.command {
        Commands::Package {
            input,
            output,
            verifier,
            iterations,
        } => {
            let kdf = KdfParams::new(iterations)?;
            let password = auth::read_new_password_with_confirmation()?;
            let report = datalock::package_files(password, &input, &output, &verifier, kdf)?;

            println!(
                "packaged {} bytes -> {} ({} bytes)",
                report.plaintext_len,
                output.display(),
                report.blob_len
            );
            println!(
                "verifier written to {} ({} iterations)",
                verifier.display(),
                report.iterations
            );
            println!("sha256 {}", hex::encode(report.fingerprint));
        }
        Commands::Verify { verifier } => {
            let record = resolve_verifier(verifier.as_deref())?;
            let triple = record.triple()?;
            let password = auth::read_password()?;

            if !triple.check(password.as_bytes()) {
                return Err(datalock::Error::AuthenticationFailed.into());
            }
            println!("password accepted");
        }
        Commands::Unlock { verifier, blob, out } => {
            let record = resolve_verifier(verifier.as_deref())?;
            let orchestrator = Orchestrator::from_record(&record, FileSource::new(&blob))?;
            let password = auth::read_password()?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start runtime")?;
            let outcome = runtime
                .block_on(orchestrator.submit(password))
                .with_context(|| format!("failed to unlock {}", blob.display()))?;

            let dataset = match outcome {
                Unlock::Dataset(bytes) => bytes,
                Unlock::Superseded => bail!("unlock attempt was superseded"),
            };

            match out {
                Some(path) => {
                    Storage::new(&path).save(&dataset)?;
                    eprintln!("wrote {} bytes to {}", dataset.len(), path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&dataset)?;
                    stdout.flush()?;
                }
            }
        }
        Commands::Inspect { blob, verifier } => {
            let data = Storage::new(&blob).load()?;
            let (header, offset) = BlobHeader::from_bytes(&data)?;
            let payload = data.len() - offset;
            let fingerprint = crypto::fingerprint(&data);

            println!("size     {} bytes", data.len());
            println!("salt     {}", hex::encode(header.salt()));
            println!("nonce    {}", hex::encode(header.nonce()));
            println!(
                "payload  {} bytes ({} plaintext + {} tag)",
                payload,
                payload - TAG_LEN,
                TAG_LEN
            );
            println!("sha256   {}", hex::encode(fingerprint));

            if let Some(path) = verifier {
                let record = load_record(&path)?;
                let status = match record.blob_fingerprint()? {
                    Some(expected) if expected == fingerprint => "matches",
                    Some(_) => "does not match",
                    None => "no fingerprint recorded",
                };
                println!("verifier {status}");
            }
        }
    }

    Ok(())
}

fn resolve_verifier(path: Option<&Path>) -> Result<VerifierRecord> {
    if let Some(path) = path {
        return load_record(path);
    }
    if let Some(record) = VerifierRecord::from_env()? {
        return Ok(record);
    }
    load_record(Path::new(DEFAULT_VERIFIER))
}

fn load_record(path: &Path) -> Result<VerifierRecord> {
    VerifierRecord::load(path)
        .with_context(|| format!("failed to load verifier record {}", path.display()))
}
