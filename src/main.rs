//! Sweet Spot session client entry point.
//!
//! Each command:
//! 1. Loads configuration from environment
//! 2. Opens the credential store
//! 3. Builds the verifier and session controller
//! 4. Runs the command and prints where the client ends up

use std::process::ExitCode;
use sweetspot::{
    auth::{HttpSessionVerifier, SessionController},
    client::AuthClient,
    config::Config,
    routes::{
        self, Navigation,
        auth::{FormOutcome, LoginForm, RegisterForm},
        nav::{NavAction, nav_links},
    },
    storage,
};

fn print_usage() {
    eprintln!("Usage: sweetspot <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                               Show the current session");
    eprintln!("  open <path>                          Navigate to a screen, e.g. /admin");
    eprintln!("  login <email> <password>             Log in and store the session token");
    eprintln!("  register <username> <email> <password>");
    eprintln!("                                       Create an account");
    eprintln!("  logout                               Clear the stored session");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  AUTH_API_URL=http://localhost:8080/api");
    eprintln!("  CREDENTIAL_PATH=.sweetspot/credentials.json");
}

enum Command {
    Status,
    Open(String),
    Login(LoginForm),
    Register(RegisterForm),
    Logout,
}

fn parse_args(args: &[String]) -> Option<Command> {
    match args {
        [cmd] if cmd == "status" => Some(Command::Status),
        [cmd] if cmd == "logout" => Some(Command::Logout),
        [cmd, path] if cmd == "open" => Some(Command::Open(path.clone())),
        [cmd, email, password] if cmd == "login" => Some(Command::Login(LoginForm {
            email: email.clone(),
            password: password.clone(),
        })),
        [cmd, username, email, password] if cmd == "register" => {
            Some(Command::Register(RegisterForm {
                username: username.clone(),
                email: email.clone(),
                password: password.clone(),
                confirm_password: password.clone(),
            }))
        }
        _ => None,
    }
}

fn print_outcome(outcome: &FormOutcome) -> ExitCode {
    match outcome {
        FormOutcome::Navigate(location) => {
            println!("-> {}", location);
            ExitCode::SUCCESS
        }
        FormOutcome::Error(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        print_usage();
        return ExitCode::FAILURE;
    };

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "Loaded configuration");

    let store = match storage::open_store(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Credential store error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = AuthClient::new(&config.api_base_url);
    let verifier = HttpSessionVerifier::with_client(client.http().clone(), client.base_url());
    let controller = SessionController::new(verifier, store);

    match command {
        Command::Status => {
            let state = controller.initialize().await;
            println!("Session: {}", state);
            for link in nav_links(&state) {
                match link.action {
                    NavAction::Navigate(path) => println!("  {:<14} {}", link.label, path),
                    NavAction::Logout => println!("  {:<14} (sweetspot logout)", link.label),
                }
            }
            ExitCode::SUCCESS
        }
        Command::Open(path) => {
            let state = controller.initialize().await;
            match routes::resolve(&path, &state) {
                Navigation::Render(screen) => println!("Showing {}", screen),
                Navigation::Redirect(location) => println!("Redirected to {}", location),
                // initialize() always settles, but a hung verifier would leave us here
                Navigation::Pending => println!("Loading..."),
            }
            ExitCode::SUCCESS
        }
        Command::Login(form) => {
            controller.initialize().await;
            print_outcome(&routes::auth::submit_login(&client, &controller, &form).await)
        }
        Command::Register(form) => print_outcome(&routes::auth::submit_register(&client, &form).await),
        Command::Logout => {
            println!("-> {}", routes::auth::logout(&controller));
            ExitCode::SUCCESS
        }
    }
}
