pub mod bugreport;
pub mod client;
pub mod server;
pub mod version;

pub const SERVER_SUBCOMMAND: &str = "server";
pub const SERVER_DESCRIPTION: &str = "Run the server";

pub const VERSION_SUBCOMMAND: &str = "version";
pub const VERSION_DESCRIPTION: &str = "Display the version and build information";

pub const BUGREPORT_SUBCOMMAND: &str = "bugreport";
pub const BUGREPORT_DESCRIPTION: &str = "Collect information about the environment for bug reporting";

pub const INSERT_SUBCOMMAND: &str = "insert";
pub const INSERT_DESCRIPTION: &str = "Insert a file into the store";

pub const LIST_SUBCOMMAND: &str = "list";
pub const LIST_DESCRIPTION: &str = "List all files in the store";

pub const GET_SUBCOMMAND: &str = "get";
pub const GET_DESCRIPTION: &str = "Download a file from the store by id";

pub const DELETE_SUBCOMMAND: &str = "delete";
pub const DELETE_DESCRIPTION: &str = "Delete a file from the store by id";

pub fn parse_id(raw: &str) -> Option<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            println!("invalid file id: {raw}");
            None
        }
    }
}
