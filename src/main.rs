use clap::{Args, Parser, Subcommand};
use team_builder::orquestrator::ServicesOrquestrator;

#[derive(Parser, Debug)]
#[command(
    name = "team-builder",
    about = "Run the Team Builder website and manage its accounts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the website (default command)
    Serve(ServeArgs),
    /// Create an active staff account that can review skill requests
    CreateStaff(CreateStaffArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct CreateStaffArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let orquestrator = ServicesOrquestrator::default()
        .load_environment_variables()
        .set_config_from_env()
        .init_tracing()
        .enable_migrations();

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => orquestrator.override_port(args.port).run()?,
        Command::CreateStaff(args) => {
            let user = orquestrator.create_staff(&args.email, &args.username, &args.password)?;
            println!("Created staff user {} ({})", user.username, user.email);
        }
    }

    Ok(())
}
