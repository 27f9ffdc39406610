use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use portail::config::{ConfigError, PortalConfig};
use portail::net::types::{Domaine, NewDemande, RequestType, Role, Statut, UserForm};
use portail::net::{ApiError, RestBackend};
use portail::routes::{self, Navigation};
use portail::session::AuthSession;
use portail::store::FileStore;
use portail::views::dashboard::DashboardView;
use portail::views::demandes::DemandesView;
use portail::views::login::LoginView;
use portail::views::municipalites::MunicipalitesView;
use portail::views::public::{PasswordResetView, SubmissionView, TrackingView};
use portail::views::users::UsersView;
use portail::views::{LoadOutcome, Notice, ViewContext, ViewError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error("not allowed here; go to {0}")]
    Redirected(String),
    #[error("login failed")]
    LoginFailed,
    #[error("{0}")]
    Failed(String),
    #[error("stdin: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portail", about = "Municipal citizen-request portal client")]
struct Cli {
    #[arg(long, env = "PORTAIL_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "PORTAIL_STORE_PATH", help = "Session file")]
    store: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Answer yes to confirmation prompts")]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session.
    Login {
        email: String,
        #[arg(long, env = "PORTAIL_PASSWORD", help = "Read from stdin when omitted")]
        password: Option<String>,
    },
    /// Revoke the refresh token and drop the local session.
    Logout,
    Whoami,
    /// Resolve a portal URL through the route guard.
    Navigate { url: String },
    Demandes(DemandesCommand),
    Municipalites(MunicipalitesCommand),
    Users(UsersCommand),
    Stats,
    /// Submit a demande anonymously.
    Submit(SubmitArgs),
    /// Look up a demande by tracking key.
    Track { key: String },
    ResetPassword { email: String },
}

#[derive(Args, Debug)]
struct DemandesCommand {
    #[command(subcommand)]
    command: DemandesSubcommand,
}

#[derive(Subcommand, Debug)]
enum DemandesSubcommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
    },
    Status {
        id: String,
        #[arg(value_parser = parse_statut)]
        statut: Statut,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct MunicipalitesCommand {
    #[command(subcommand)]
    command: MunicipalitesSubcommand,
}

#[derive(Subcommand, Debug)]
enum MunicipalitesSubcommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
    },
    Add {
        name: String,
    },
    Rename {
        id: String,
        name: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
    },
    Add(UserArgs),
    /// Edit an account; omitted fields keep their current value.
    Update {
        id: String,
        #[command(flatten)]
        fields: UserPatchArgs,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct UserArgs {
    #[arg(long)]
    nom: String,
    #[arg(long)]
    prenom: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, value_parser = parse_role)]
    role: Role,
    #[arg(long)]
    phone: String,
}

#[derive(Args, Debug)]
struct UserPatchArgs {
    #[arg(long)]
    nom: Option<String>,
    #[arg(long)]
    prenom: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long, help = "Required: the backend expects the password on every edit")]
    password: String,
    #[arg(long, value_parser = parse_role)]
    role: Option<Role>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long)]
    nom_complet: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    telephone: String,
    #[arg(long)]
    adresse: String,
    #[arg(long = "type", value_parser = parse_request_type)]
    request_type: RequestType,
    #[arg(long, value_parser = parse_domaine)]
    domaine: Domaine,
    #[arg(long)]
    municipalite: String,
    #[arg(long)]
    titre: String,
    #[arg(long)]
    description: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = PortalConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
    }
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    let backend = Arc::new(RestBackend::new(&config.api_base_url, config.timeouts)?);
    let store = Arc::new(FileStore::open(config.store_path.clone()));
    let auth = Arc::new(AuthSession::new(backend, store));
    let ctx = ViewContext::new(auth.clone(), config.lang);
    let prompt = Prompt { assume_yes: cli.yes };

    match cli.command {
        Command::Login { email, password } => run_login(ctx, &email, password).await,
        Command::Logout => {
            auth.revoke_and_logout().await;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&auth),
        Command::Navigate { url } => {
            match routes::navigate(&auth, &url) {
                Navigation::Render(route) => println!("render {route}"),
                Navigation::Redirect(target) => println!("redirect {target}"),
            }
            Ok(())
        }
        Command::Demandes(cmd) => run_demandes(ctx, &config, &prompt, cmd.command).await,
        Command::Municipalites(cmd) => run_municipalites(ctx, &prompt, cmd.command).await,
        Command::Users(cmd) => run_users(ctx, &prompt, cmd.command).await,
        Command::Stats => run_stats(ctx).await,
        Command::Submit(args) => run_submit(ctx, args).await,
        Command::Track { key } => run_track(ctx, &key).await,
        Command::ResetPassword { email } => {
            let mut view = PasswordResetView::new(ctx);
            let sent = view.request(&email).await?;
            finish(view.take_notices(), sent)
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

async fn run_login(ctx: ViewContext, email: &str, password: Option<String>) -> Result<(), CliError> {
    let password = match password {
        Some(p) => p,
        None => read_line("password: ")?,
    };
    let mut view = LoginView::new(ctx, routes::LOGIN_PATH);
    let next = view.submit(email, &password).await;
    print_notices(&view.take_notices());
    match next {
        Some(next) => {
            println!("logged in as {}; continue at {next}", view.email());
            Ok(())
        }
        None => Err(CliError::LoginFailed),
    }
}

#[derive(Serialize)]
struct Whoami {
    email: Option<String>,
    groups: Vec<String>,
    admin: bool,
    super_admin: bool,
}

fn run_whoami(auth: &AuthSession) -> Result<(), CliError> {
    let Some(session) = auth.session().filter(portail::session::Session::is_authenticated) else {
        println!("not logged in");
        return Ok(());
    };
    print_json(&Whoami {
        admin: session.is_admin(),
        super_admin: session.is_super_admin(),
        groups: session.groups.clone().unwrap_or_default().into_iter().collect(),
        email: session.email,
    })
}

// =============================================================================
// STAFF PAGES
// =============================================================================

async fn run_demandes(
    ctx: ViewContext,
    config: &PortalConfig,
    prompt: &Prompt,
    command: DemandesSubcommand,
) -> Result<(), CliError> {
    enter(&ctx, "/demandes")?;
    let mut view = DemandesView::new(ctx, config.status_revert);
    loaded(view.load().await)?;

    match command {
        DemandesSubcommand::List { search } => {
            view.set_search(&search);
            print_json(&view.visible())?;
        }
        DemandesSubcommand::Status { id, statut } => {
            view.begin_status_change(&id, statut)?;
            if prompt.ask(&format!("set demande {id} to '{statut}'?"))? {
                view.confirm().await?;
            } else {
                view.cancel()?;
            }
        }
        DemandesSubcommand::Delete { id } => {
            view.begin_delete(&id)?;
            if prompt.ask(&format!("delete demande {id}?"))? {
                view.confirm().await?;
            } else {
                view.cancel()?;
            }
        }
    }
    finish(view.take_notices(), true)
}

async fn run_municipalites(ctx: ViewContext, prompt: &Prompt, command: MunicipalitesSubcommand) -> Result<(), CliError> {
    enter(&ctx, "/municipalites")?;
    let mut view = MunicipalitesView::new(ctx);
    loaded(view.load().await)?;

    let question = match command {
        MunicipalitesSubcommand::List { search } => {
            view.set_search(&search);
            print_json(&view.visible())?;
            None
        }
        MunicipalitesSubcommand::Add { name } => {
            view.add(&name)?;
            Some(format!("add municipality '{}'?", name.trim()))
        }
        MunicipalitesSubcommand::Rename { id, name } => {
            view.rename(&id, &name)?;
            Some(format!("rename municipality {id} to '{}'?", name.trim()))
        }
        MunicipalitesSubcommand::Delete { id } => {
            view.delete(&id)?;
            Some(format!("delete municipality {id}?"))
        }
    };
    if let Some(question) = question {
        if prompt.ask(&question)? {
            view.confirm().await?;
        } else {
            view.cancel()?;
        }
    }
    finish(view.take_notices(), true)
}

async fn run_users(ctx: ViewContext, prompt: &Prompt, command: UsersSubcommand) -> Result<(), CliError> {
    enter(&ctx, "/users")?;
    let mut view = UsersView::new(ctx);
    loaded(view.load().await)?;

    let question = match command {
        UsersSubcommand::List { search } => {
            view.set_search(&search);
            print_json(&view.visible())?;
            None
        }
        UsersSubcommand::Add(args) => {
            let email = args.email.clone();
            view.add(UserForm {
                nom: args.nom,
                prenom: args.prenom,
                email: args.email,
                password: args.password,
                role: Some(args.role),
                numero_telephone: args.phone,
            })?;
            Some(format!("create account {email}?"))
        }
        UsersSubcommand::Update { id, fields } => {
            let mut form = view.begin_edit(&id)?;
            form.password = fields.password;
            if let Some(nom) = fields.nom {
                form.nom = nom;
            }
            if let Some(prenom) = fields.prenom {
                form.prenom = prenom;
            }
            if let Some(email) = fields.email {
                form.email = email;
            }
            if fields.role.is_some() {
                form.role = fields.role;
            }
            if let Some(phone) = fields.phone {
                form.numero_telephone = phone;
            }
            view.save_edit(form)?;
            Some(format!("save changes to account {id}?"))
        }
        UsersSubcommand::Delete { id } => {
            view.delete(&id)?;
            Some(format!("delete account {id}?"))
        }
    };
    if let Some(question) = question {
        if prompt.ask(&question)? {
            view.confirm().await?;
        } else {
            view.cancel()?;
            view.cancel_edit();
        }
    }
    finish(view.take_notices(), true)
}

async fn run_stats(ctx: ViewContext) -> Result<(), CliError> {
    enter(&ctx, "/dashboard")?;
    let mut view = DashboardView::new(ctx);
    loaded(view.load().await)?;
    if let Some(stats) = view.stats() {
        print_json(stats)?;
    }
    finish(view.take_notices(), true)
}

// =============================================================================
// PUBLIC PAGES
// =============================================================================

async fn run_submit(ctx: ViewContext, args: SubmitArgs) -> Result<(), CliError> {
    let mut view = SubmissionView::new(ctx);
    view.load().await;
    let demande = NewDemande {
        nom_complet: args.nom_complet,
        email: args.email,
        telephone: args.telephone,
        adresse: args.adresse,
        request_type: args.request_type,
        domaine: args.domaine,
        municipalite: args.municipalite,
        titre: args.titre,
        description: args.description,
    };
    let key = view.submit(&demande).await?;
    if let Some(key) = &key {
        println!("{key}");
    }
    finish(view.take_notices(), key.is_some())
}

async fn run_track(ctx: ViewContext, key: &str) -> Result<(), CliError> {
    let mut view = TrackingView::new(ctx);
    let found = view.track(key).await?.cloned();
    if let Some(status) = &found {
        print_json(status)?;
    }
    finish(view.take_notices(), found.is_some())
}

// =============================================================================
// HELPERS
// =============================================================================

/// Run the route guard for `path` before touching a staff page.
fn enter(ctx: &ViewContext, path: &str) -> Result<(), CliError> {
    match routes::navigate(&ctx.session, path) {
        Navigation::Render(_) => Ok(()),
        Navigation::Redirect(target) => Err(CliError::Redirected(target)),
    }
}

fn loaded(outcome: LoadOutcome) -> Result<(), CliError> {
    match outcome {
        LoadOutcome::Loaded | LoadOutcome::Skipped => Ok(()),
        LoadOutcome::Redirect(target) => Err(CliError::Redirected(target)),
    }
}

struct Prompt {
    assume_yes: bool,
}

impl Prompt {
    fn ask(&self, question: &str) -> Result<bool, CliError> {
        if self.assume_yes {
            return Ok(true);
        }
        let answer = read_line(&format!("{question} [y/N] "))?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "o" | "oui"))
    }
}

fn read_line(prompt: &str) -> Result<String, CliError> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        match notice {
            Notice::Success(text) => eprintln!("{text}"),
            Notice::Error { title, text } => eprintln!("{title} {text}"),
        }
    }
}

/// Print notices; the first error notice (or `ok == false`) fails the command.
fn finish(notices: Vec<Notice>, ok: bool) -> Result<(), CliError> {
    print_notices(&notices);
    if let Some(error) = notices.into_iter().find(Notice::is_error) {
        return Err(CliError::Failed(error.text().to_owned()));
    }
    if ok { Ok(()) } else { Err(CliError::Failed("nothing to show".to_owned())) }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn parse_statut(raw: &str) -> Result<Statut, String> {
    Statut::parse(raw).ok_or_else(|| format!("unknown status '{raw}' (expected 'non traité', 'en cours' or 'traité')"))
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role '{raw}' (expected 'admin' or 'superadmin')"))
}

fn parse_request_type(raw: &str) -> Result<RequestType, String> {
    RequestType::parse(raw).ok_or_else(|| format!("unknown request type '{raw}'"))
}

fn parse_domaine(raw: &str) -> Result<Domaine, String> {
    Domaine::parse(raw).ok_or_else(|| format!("unknown domaine '{raw}'"))
}
