use bugreport::{
    bugreport,
    collector::{CompileTimeInformation, EnvironmentVariables, OperatingSystem, SoftwareVersion},
    format::Markdown,
};

pub fn run() {
    bugreport!()
        .info(SoftwareVersion::default())
        .info(OperatingSystem::default())
        .info(EnvironmentVariables::list(&[
            "SHELL",
            "TERM",
            "FSTORE_DATA_DIR",
            "FSTORE_DB_FILE",
            "FSTORE_PORT",
            "FSTORE_MAX_FILE_SIZE",
            "FSTORE_ALLOWED_TYPES",
        ]))
        .info(CompileTimeInformation::default())
        .print::<Markdown>();
}
