//! zkim CLI — container inspection tooling (no key management: the
//! Encryption Engine's key material lives with its caller, not on disk).
//!
//! Usage:
//!   zkim inspect <file>
//!   zkim validate <file>

use std::fs;
use std::process::ExitCode;

use crate::model::{CompressionType, EncryptionType, HashType, SignatureType};
use crate::recovery;
use crate::wire;

pub fn run(args: &[String]) -> ExitCode {
    if args.is_empty() {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[0].as_str() {
        "inspect" => cmd_inspect(&args[1..]),
        "validate" => cmd_validate(&args[1..]),
        "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" => {
            println!("zkim {}", crate::VERSION);
            Ok(())
        }
        cmd => {
            eprintln!("error: unknown command '{cmd}'");
            print_usage();
            Err("unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"zkim CLI — ZKIM container inspection

USAGE:
    zkim <COMMAND> [OPTIONS]

COMMANDS:
    inspect <file>      Show header/metadata/chunk layout (no decryption)
    validate <file>     Decode and run chunk/signature-length invariants,
                         classify corruption if decode fails

OPTIONS:
    -h, --help       Print help
    -V, --version    Print version
"#
    );
}

fn cmd_inspect(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.first().ok_or("missing file path")?;
    let bytes = fs::read(path)?;

    let container = wire::decode(&bytes).map_err(|e| format!("decode failed: {e}"))?;
    let header = &container.header;

    println!("ZKIM Container");
    println!("==============");
    println!("File id:          {}", hex_string(&header.file_id));
    println!("User id:          {}", String::from_utf8_lossy(&header.user_id));
    println!("Platform key id:  {}", String::from_utf8_lossy(&header.platform_key_id));
    println!("Total size:       {} bytes", header.total_size);
    println!("Chunk count:      {}", header.chunk_count);
    println!("Created at:       {}", header.created_at);
    println!("Compression:      {}", compression_name(header.compression_type));
    println!("Encryption:       {}", encryption_name(header.encryption_type));
    println!("Hash:             {}", hash_name(header.hash_type));
    println!("Signature:        {}", signature_name(header.signature_type));
    println!();
    println!("Metadata");
    println!("--------");
    println!("File name:        {}", container.metadata.file_name);
    println!("MIME type:        {}", container.metadata.mime_type);
    println!("Tags:             {:?}", container.metadata.tags);
    println!(
        "Access control:   {}",
        if container.metadata.access_control.is_some() { "present" } else { "none" }
    );
    println!(
        "Retention policy: {}",
        if container.metadata.retention_policy.is_some() { "present" } else { "none" }
    );
    println!();
    println!("Wire size:        {} bytes", bytes.len());
    println!("KEM ciphertext:   {} bytes", container.kem_ciphertext.len());

    Ok(())
}

fn cmd_validate(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.first().ok_or("missing file path")?;
    let bytes = fs::read(path)?;

    match wire::decode(&bytes) {
        Ok(container) => match container.validate_chunk_invariants() {
            Ok(()) => {
                println!("OK: container decodes and chunk invariants hold");
                Ok(())
            }
            Err(e) => Err(format!("decoded but invariants failed: {e}").into()),
        },
        Err(_) => {
            let diagnosis = recovery::diagnose(&bytes);
            match diagnosis {
                Some(d) => {
                    let (strategy, confidence) = recovery::select_strategy(d.kind, d.severity);
                    println!(
                        "CORRUPT: kind={:?} severity={:?} strategy={:?} confidence={confidence}",
                        d.kind, d.severity, strategy
                    );
                    Ok(())
                }
                None => Err("decode failed but no corruption classified".into()),
            }
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

fn compression_name(t: CompressionType) -> &'static str {
    match t {
        CompressionType::None => "none",
        CompressionType::Brotli => "brotli",
        CompressionType::Gzip => "gzip",
    }
}

fn encryption_name(t: EncryptionType) -> &'static str {
    match t {
        EncryptionType::XChaCha20Poly1305 => "XChaCha20-Poly1305",
    }
}

fn hash_name(t: HashType) -> &'static str {
    match t {
        HashType::Sha3_256 => "SHA3-256",
    }
}

fn signature_name(t: SignatureType) -> &'static str {
    match t {
        SignatureType::MlDsa65 => "ML-DSA-65",
    }
}
