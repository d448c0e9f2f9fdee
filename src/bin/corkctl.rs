use std::path::PathBuf;
use std::str::FromStr;

use clap::{builder::PossibleValuesParser, value_parser, Arg, Command};

use corkboard::config::Config;
use corkboard::models::{NewUser, Role, SingleConnection};
use corkboard::{Error, Result};

fn main_res() -> Result<()> {
    let matches = Command::new("corkctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Control a corkboard instance")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help("Config file to use"),
        )
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help("Database file to use"),
        )
        .subcommand(
            Command::new("add-user")
                .about("Register a new user")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("The display name of the user")
                        .required(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("email")
                        .short('e')
                        .long("email")
                        .help("The e-mail address of the user")
                        .required(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("dept")
                        .long("dept")
                        .help("The department the user belongs to")
                        .num_args(1)
                        .default_value(""),
                )
                .arg(
                    Arg::new("role")
                        .short('r')
                        .long("role")
                        .help("The permission tier of the user")
                        .num_args(1)
                        .default_value("user")
                        .value_parser(PossibleValuesParser::new(["user", "moderator", "admin"])),
                )
                .arg(
                    Arg::new("pass")
                        .short('p')
                        .long("pass")
                        .help("The password for the user")
                        .required(true)
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("set-role")
                .about("Change a user's role")
                .arg(
                    Arg::new("email")
                        .short('e')
                        .long("email")
                        .help("The e-mail address of the user")
                        .required(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("role")
                        .short('r')
                        .long("role")
                        .help("The new permission tier")
                        .required(true)
                        .num_args(1)
                        .value_parser(PossibleValuesParser::new(["user", "moderator", "admin"])),
                ),
        )
        .subcommand(Command::new("list-users").about("List all registered users"))
        .subcommand(Command::new("summary").about("Show the admin summary"))
        .subcommand(Command::new("gen-config").about("Write a default config file to stdout"))
        .subcommand(
            Command::new("check-config").about("Check the configuration file for errors"),
        )
        .get_matches();

    if matches.subcommand_matches("gen-config").is_some() {
        Config::generate(std::io::stdout())?;
        return Ok(());
    }

    let conf_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(Config::default_path);

    if matches.subcommand_matches("check-config").is_some() {
        let config = Config::open(&conf_path)?;

        println!("Configuration: {}", conf_path.display());
        println!("  database path: {}", config.database_path.display());
        println!("  upload dir: {}", config.upload_dir.display());
        println!("\nAll config files are good.");

        return Ok(());
    }

    let mut config = if conf_path.exists() {
        Config::open(&conf_path)?
    } else {
        Config::default()
    };

    if let Some(path) = matches.get_one::<PathBuf>("database") {
        config.database_path = path.clone();
    }

    corkboard::init_logging(config.log_file.as_deref())?;

    let mut db = SingleConnection::establish(&config.database_path)?;

    if let Some(matches) = matches.subcommand_matches("add-user") {
        let role = Role::from_str(matches.get_one::<String>("role").unwrap())?;

        let new_user = NewUser::new(
            matches.get_one::<String>("name").unwrap(),
            matches.get_one::<String>("email").unwrap(),
            matches.get_one::<String>("dept").unwrap(),
            role,
            matches.get_one::<String>("pass").unwrap(),
        )?;

        let user_id = db.insert_user(&new_user)?;

        println!("Added user #{} <{}>", user_id, new_user.email);
    }

    if let Some(matches) = matches.subcommand_matches("set-role") {
        let email = matches.get_one::<String>("email").unwrap();
        let role = Role::from_str(matches.get_one::<String>("role").unwrap())?;

        let user = db
            .user_by_email(email)?
            .ok_or_else(|| Error::EmailNotFound {
                email: email.clone(),
            })?;

        db.set_user_role(user.id, role)?;

        println!("Set role of {} to {}", user.email, role);
    }

    if matches.subcommand_matches("list-users").is_some() {
        for user in db.all_users()? {
            println!("{:4}  {:9}  {} <{}>", user.id, user.role, user.name, user.email);
        }
    }

    if matches.subcommand_matches("summary").is_some() {
        println!("threads: {}", db.num_threads()?);
        println!("comments: {}", db.num_comments()?);
        println!("users: {}", db.num_users()?);
        println!("unhandled reports: {}", db.num_unhandled_reports()?);

        let recent = db.recent_reports(10)?;

        if !recent.is_empty() {
            println!("\nRecent reports:");

            for report in recent {
                println!(
                    "  #{} [{}] {} #{} by user #{}: {}",
                    report.id,
                    report.status,
                    report.target_type,
                    report.target_id,
                    report.reporter,
                    report.reason,
                );
            }
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = main_res() {
        eprintln!("{}", e);
        std::process::exit(-1);
    }
}
