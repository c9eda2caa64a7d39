//! Petite CLI pour explorer et modifier une image de disquette FAT12.
//!
//! Cette CLI s’appuie sur la bibliothèque `fat12_parser`:
//! - `--info` : nom OS, étiquette, tailles, nombre de fichiers, FAT
//! - `--list` : arborescence complète, répertoire par répertoire
//! - `--get`  : copie un fichier de l’image vers le disque hôte
//! - `--put`  : ajoute un fichier hôte dans l’image (persistant)
//!
//! Exemple rapide:
//! ```text
//! fat12_cli --file disk.IMA --info
//! fat12_cli --file disk.IMA --list
//! fat12_cli --file disk.IMA --get /SUB/NOTE.TXT
//! fat12_cli --file disk.IMA --put ./local.txt /SUB
//! ```

mod logger;

use std::env;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Datelike, Local, Timelike};
use fat12_parser::{DirEntry, Fat12, Fat12Mut, FatError, Timestamp};

/// Affiche l’usage de la CLI avec les commandes disponibles.
fn print_usage() {
    eprintln!(
        "Usage:
  fat12_cli --file <disk.img> (--info | --list | --get <path> [dest] | --put <host_file> [dir])
            [-v | --verbose]

Exemples:
  fat12_cli --file disk.IMA --info
  fat12_cli --file disk.IMA --list
  fat12_cli --file disk.IMA --get /SUB/NOTE.TXT
  fat12_cli --file disk.IMA --put ./local.txt /SUB

Log: variable {} (error, warn, info, debug, trace)",
        logger::LOG_ENV
    );
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Info,
    List,
    Get { path: String, dest: Option<String> },
    Put { src: String, dir: Option<String> },
}

#[derive(Debug)]
struct Args {
    image: String,
    command: Command,
    verbose: bool,
}

/// Parse les arguments (sans le nom du programme).
fn parse_args<I: Iterator<Item = String>>(args: I) -> Result<Args> {
    let mut args = args.peekable();
    let mut image = None;
    let mut command = None;
    let mut verbose = false;

    // un argument optionnel ne commence jamais par `-`
    fn optional<I: Iterator<Item = String>>(args: &mut std::iter::Peekable<I>) -> Option<String> {
        args.next_if(|a| !a.starts_with('-'))
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--file" | "-f" => image = args.next(),
            "--info" => command = Some(Command::Info),
            "--list" | "--ls" => command = Some(Command::List),
            "--get" => {
                let path = args.next().ok_or_else(|| anyhow!("--get nécessite un chemin"))?;
                command = Some(Command::Get {
                    path,
                    dest: optional(&mut args),
                });
            }
            "--put" => {
                let src = args
                    .next()
                    .ok_or_else(|| anyhow!("--put nécessite un fichier source"))?;
                command = Some(Command::Put {
                    src,
                    dir: optional(&mut args),
                });
            }
            "-v" | "--verbose" => verbose = true,
            _ => bail!("argument inconnu : {arg}"),
        }
    }

    Ok(Args {
        image: image.ok_or_else(|| anyhow!("--file est obligatoire"))?,
        command: command.ok_or_else(|| anyhow!("aucune commande"))?,
        verbose,
    })
}

/// Point d’entrée de la CLI: parse les arguments,
/// lit l’image en mémoire, puis exécute la commande demandée.
fn main() {
    let args = match parse_args(env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(e) = logger::init(args.verbose) {
        eprintln!("logger déjà initialisé: {e}");
    }

    if let Err(e) = run(args) {
        eprintln!("Erreur: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut data = fs::read(&args.image)
        .with_context(|| format!("impossible de lire {}", args.image))?;

    match args.command {
        Command::Info => run_info(&Fat12::new(&data)?),
        Command::List => {
            run_list(&Fat12::new(&data)?);
            Ok(())
        }
        Command::Get { path, dest } => run_get(&Fat12::new(&data)?, &path, dest.as_deref()),
        Command::Put { src, dir } => {
            run_put(&mut data, &src, dir.as_deref().unwrap_or("/"))?;
            fs::write(&args.image, &data)
                .with_context(|| format!("impossible d'écrire {}", args.image))?;
            Ok(())
        }
    }
}

/// Affiche les informations du volume.
fn run_info(fs: &Fat12) -> Result<()> {
    let info = fs.volume_info()?;

    println!("OS Name: {}", info.os_name);
    println!("Label of the disk: {}", info.label.as_deref().unwrap_or(""));
    println!("Total Size of the disk: {}", info.total_bytes);
    println!("Free size of the disk: {}", info.free_bytes);
    println!("==============");
    println!("The number of files in the disk: {}", info.file_count);
    println!("==============");
    println!("Number of FAT copies: {}", info.fat_copies);
    println!("Sectors per FAT: {}", info.sectors_per_fat);
    Ok(())
}

/// Une ligne de listing : type, taille, nom, date de création.
fn format_entry(e: &DirEntry) -> String {
    let kind = if e.is_dir() { 'D' } else { 'F' };
    let t = e.created();
    format!(
        "{kind} {:>10} {:>20} {}-{:02}-{:02} {:02}:{:02}",
        e.size, e.name, t.year, t.month, t.day, t.hour, t.minute
    )
}

/// Chemin du répertoire parent (`"/SUB/A.TXT"` -> `"/SUB"`, `"/A.TXT"` -> `""`).
fn parent_of(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

/// Liste toute l’arborescence, un bloc par répertoire.
fn run_list(fs: &Fat12) {
    let tree: Vec<(String, DirEntry)> = fs.list_tree().collect();

    let mut dirs = vec![String::new()];
    dirs.extend(tree.iter().filter(|(_, e)| e.is_dir()).map(|(p, _)| p.clone()));

    for (i, dir) in dirs.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", if dir.is_empty() { "Root" } else { dir.as_str() });
        println!("==============");
        for (_, e) in tree.iter().filter(|(p, _)| parent_of(p) == dir) {
            println!("{}", format_entry(e));
        }
    }
}

/// Copie un fichier de l’image vers `dest` (par défaut : son nom 8.3).
fn run_get(fs: &Fat12, path: &str, dest: Option<&str>) -> Result<()> {
    let entry = match fs.lookup(path) {
        Ok(e) => e,
        Err(FatError::EntryNotFound | FatError::PathNotFound) => {
            println!("File not found.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let content = fs.read_file(&entry)?;
    let dest = dest.unwrap_or(entry.name.as_str());
    fs::write(dest, &content).with_context(|| format!("impossible d'écrire {dest}"))?;

    log::info!("{path} -> {dest} ({} octets)", content.len());
    Ok(())
}

/// Date de modification d’un fichier hôte, à la minute près.
fn timestamp_of(modified: SystemTime) -> Timestamp {
    let local: DateTime<Local> = modified.into();
    Timestamp {
        year: local.year().clamp(1980, 2107) as u16,
        month: local.month() as u8,
        day: local.day() as u8,
        hour: local.hour() as u8,
        minute: local.minute() as u8,
    }
}

/// Ajoute le fichier hôte `src` dans le répertoire `dir` de l’image.
fn run_put(data: &mut [u8], src: &str, dir: &str) -> Result<()> {
    let src_path = Path::new(src);
    let content = match fs::read(src_path) {
        Ok(v) => v,
        Err(e) => {
            println!("File not found.");
            return Err(anyhow!(e).context(format!("impossible de lire {src}")));
        }
    };
    let modified = fs::metadata(src_path)
        .and_then(|m| m.modified())
        .with_context(|| format!("date de modification de {src}"))?;
    let name = src_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("nom de fichier invalide : {src}"))?;

    let mut rw = Fat12Mut::new(data)?;
    match rw.insert_file(name, &content, timestamp_of(modified), dir) {
        Ok(entry) => {
            println!("OK: {src} -> {dir} ({}, {} octets)", entry.name, entry.size);
            Ok(())
        }
        Err(FatError::DiskFull { .. }) => bail!("No enough free space in the disk image."),
        Err(FatError::PathNotFound) => bail!("The directory not found."),
        Err(e) => Err(e.into()),
    }
}
