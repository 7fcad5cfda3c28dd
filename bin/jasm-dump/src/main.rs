use jasm::jvm::class_file::{ClassFile, Listing};
use jasm::jvm::{Error, LogSink};

use clap::{Arg, ArgAction, Command};
use std::fs;

fn main() -> Result<(), Error> {
    env_logger::init();

    let matches = Command::new("JVM class file dumper")
        .version(clap::crate_version!())
        .about("Print an assembler-like listing of a class file")
        .arg(
            Arg::new("rewrite")
                .long("rewrite")
                .value_name("OUTPUT")
                .action(ArgAction::Set)
                .help("Also write the class back out to this path"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("Don't print the listing"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Class file to read")
                .required(true)
                .index(1),
        )
        .get_matches();

    let class_file = matches
        .get_one::<String>("INPUT")
        .expect("INPUT is a required argument");
    log::info!("Reading '{}'", class_file);
    let bytes = fs::read(class_file)?;
    let class = ClassFile::from_bytes(&bytes, &mut LogSink)?;

    if !matches.get_flag("quiet") {
        print!("{}", Listing(&class));
    }

    if let Some(output) = matches.get_one::<String>("rewrite") {
        log::info!("Writing '{}'", output);
        class.save_to_path(output, true)?;
        if fs::read(output)? != bytes {
            log::warn!("'{}' differs from '{}'", output, class_file);
        }
    }

    Ok(())
}
