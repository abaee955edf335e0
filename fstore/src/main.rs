use clap::{arg, command, crate_name, Arg, Command};
use client::FileParams;

mod cli;

#[tokio::main]
async fn main() {
    let cli = command!(crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand(Command::new(cli::VERSION_SUBCOMMAND).about(cli::VERSION_DESCRIPTION))
        .subcommand(Command::new(cli::BUGREPORT_SUBCOMMAND).about(cli::BUGREPORT_DESCRIPTION))
        .subcommand(Command::new(cli::SERVER_SUBCOMMAND).about(cli::SERVER_DESCRIPTION))
        .subcommand(
            Command::new(cli::INSERT_SUBCOMMAND)
                .about(cli::INSERT_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI"))
                .arg(
                    arg!(-f --file <FILE>)
                        .required(true)
                        .help("Path to file to insert"),
                )
                .arg(
                    Arg::new("type")
                        .short('t')
                        .long("type")
                        .required(false)
                        .help("Declared content type of the file"),
                ),
        )
        .subcommand(
            Command::new(cli::LIST_SUBCOMMAND)
                .about(cli::LIST_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI")),
        )
        .subcommand(
            Command::new(cli::GET_SUBCOMMAND)
                .about(cli::GET_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI"))
                .arg(arg!(-i --id <ID>).required(true).help("File id"))
                .arg(
                    arg!(-o --output <FILE>)
                        .required(false)
                        .help("Path to write the file to (stdout if not set)"),
                ),
        )
        .subcommand(
            Command::new(cli::DELETE_SUBCOMMAND)
                .about(cli::DELETE_DESCRIPTION)
                .arg(arg!(-u --uri <URI>).required(true).help("Fstore URI"))
                .arg(arg!(-i --id <ID>).required(true).help("File id")),
        )
        .arg_required_else_help(true)
        .disable_version_flag(true)
        .get_matches();

    if cli.subcommand_matches(cli::VERSION_SUBCOMMAND).is_some() {
        cli::version::run();
    } else if cli.subcommand_matches(cli::BUGREPORT_SUBCOMMAND).is_some() {
        cli::bugreport::run();
    } else if cli.subcommand_matches(cli::SERVER_SUBCOMMAND).is_some() {
        cli::server::run().await;
    } else if let Some(insert_matches) = cli.subcommand_matches(cli::INSERT_SUBCOMMAND) {
        let uri = insert_matches.get_one::<String>("uri").unwrap();
        let file = insert_matches.get_one::<String>("file").unwrap();
        let mime_type = insert_matches.get_one::<String>("type").cloned();
        let params = FileParams {
            uri: uri.clone(),
            file: file.clone(),
            mime_type,
        };
        cli::client::insert_single_file(params).await;
    } else if let Some(list_matches) = cli.subcommand_matches(cli::LIST_SUBCOMMAND) {
        let uri = list_matches.get_one::<String>("uri").unwrap();
        cli::client::list_files(uri).await;
    } else if let Some(get_matches) = cli.subcommand_matches(cli::GET_SUBCOMMAND) {
        let uri = get_matches.get_one::<String>("uri").unwrap();
        let id = cli::parse_id(get_matches.get_one::<String>("id").unwrap());
        let output = get_matches.get_one::<String>("output").map(Into::into);
        if let Some(id) = id {
            cli::client::get_single_file(uri, id, output).await;
        }
    } else if let Some(delete_matches) = cli.subcommand_matches(cli::DELETE_SUBCOMMAND) {
        let uri = delete_matches.get_one::<String>("uri").unwrap();
        let id = cli::parse_id(delete_matches.get_one::<String>("id").unwrap());
        if let Some(id) = id {
            cli::client::delete_single_file(uri, id).await;
        }
    }
}
