use clap::{Parser, ValueEnum};
use quill_pagetable::buffer::{FrameId, PageId, PageTable};
use quill_pagetable::config::{PageTableConfig, DEFAULT_BUCKET_SIZE};
use quill_pagetable::error::{PageTableError, PageTableResult};
use quill_pagetable::hash::{IdentityHasher, KeyHasher, SipKeyHasher, HASH_BITS};
use quill_pagetable::utils::util::pretty_format_directory;
use rand::Rng;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HasherKind {
    Identity,
    Sip,
}

#[derive(Debug, Parser, PartialEq)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(long, default_value_t = DEFAULT_BUCKET_SIZE, help = "Entries per bucket")]
    bucket_size: usize,
    #[clap(long, default_value_t = HASH_BITS, help = "Maximum local depth")]
    max_depth: u32,
    #[clap(
        long,
        value_enum,
        default_value_t = HasherKind::Identity,
        help = "Page id hash function"
    )]
    hasher: HasherKind,
}

const HELP: &str = "\
commands:
  insert <page> <frame>   map a page to a frame
  find <page>             look up a page
  remove <page>           drop a page
  fill <n>                insert n random pages
  stats                   depths and bucket count
  dir                     print the directory
  check                   verify table invariants
  exit";

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = PageTableConfig::default()
        .with_bucket_size(args.bucket_size)
        .with_max_depth(args.max_depth);

    let result = match args.hasher {
        HasherKind::Identity => PageTable::with_hasher(config, IdentityHasher).and_then(repl),
        HasherKind::Sip => PageTable::with_hasher(config, SipKeyHasher::new()).and_then(repl),
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn repl<S: KeyHasher<PageId>>(table: PageTable<S>) -> PageTableResult<()> {
    println!(":) page table ready, type `help` for commands.");
    let mut rl = DefaultEditor::new().map_err(|e| PageTableError::Internal(e.to_string()))?;

    loop {
        match rl.readline("pagetable> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if line == "exit" || line == "\\q" {
                    println!("bye!");
                    break;
                }
                match run_command(&table, line) {
                    Ok(output) => println!("{}", output),
                    Err(e) => println!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

fn run_command<S: KeyHasher<PageId>>(
    table: &PageTable<S>,
    line: &str,
) -> PageTableResult<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["help"] => Ok(HELP.to_string()),
        ["insert", page, frame] => {
            let page_id: PageId = parse_arg(page)?;
            let frame_id: FrameId = parse_arg(frame)?;
            table.insert(page_id, frame_id)?;
            Ok(format!("page {} -> frame {}", page_id, frame_id))
        }
        ["find", page] => {
            let page_id: PageId = parse_arg(page)?;
            Ok(match table.find(page_id) {
                Some(frame_id) => format!("page {} -> frame {}", page_id, frame_id),
                None => format!("page {} not resident", page_id),
            })
        }
        ["remove", page] => {
            let page_id: PageId = parse_arg(page)?;
            Ok(format!("removed: {}", table.remove(page_id)))
        }
        ["fill", n] => {
            let n: usize = parse_arg(n)?;
            let mut rng = rand::rng();
            for frame_id in 0..n {
                table.insert(rng.random(), frame_id)?;
            }
            Ok(format!("{} entries", table.len()))
        }
        ["stats"] => Ok(format!(
            "global depth {}, {} buckets, {} entries",
            table.global_depth(),
            table.num_buckets(),
            table.len()
        )),
        ["dir"] => Ok(pretty_format_directory(&table.directory_snapshot()).to_string()),
        ["check"] => table.verify_integrity().map(|_| "ok".to_string()),
        _ => Err(PageTableError::Usage(format!(
            "unknown command `{}`, type `help`",
            line
        ))),
    }
}

fn parse_arg<T: std::str::FromStr>(arg: &str) -> PageTableResult<T> {
    arg.parse()
        .map_err(|_| PageTableError::Usage(format!("invalid number `{}`", arg)))
}
