use std::env;
use std::io::Write;
use std::str::FromStr;

use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use pet_rescue::config::AppConfig;
use pet_rescue::services::admin_tools_service;
use pet_rescue::services::baas::BaasClient;

struct Tools {
    pool: SqlitePool,
    baas: BaasClient,
    email: String,
    password: Option<String>,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pet_rescue=info")),
        )
        .init();

    let tools = match setup().await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("\n🔴 Error: {}", e);
            eprintln!("Define BAAS_URL, BAAS_ANON_KEY, BAAS_JWT_SECRET, BAAS_SERVICE_ROLE_KEY y ADMIN_EMAIL en .env");
            std::process::exit(1);
        }
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let ok = match env::args().nth(1).as_deref() {
        Some("check") => check(&tools).await,
        Some("reset") => reset(&tools, &mut input).await,
        Some("login") => login(&tools).await,
        Some(other) => {
            eprintln!("Comando desconocido: {} (usa check, reset o login)", other);
            false
        }
        None => {
            menu(&tools, &mut input).await;
            true
        }
    };
    if !ok {
        std::process::exit(1);
    }
}

async fn setup() -> Result<Tools, Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    if config.baas.service_role_key.is_none() {
        return Err("BAAS_SERVICE_ROLE_KEY is required for admin tools".into());
    }
    let email = env::var("ADMIN_EMAIL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or("ADMIN_EMAIL must be set in the environment")?;
    let password = env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty());

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(Tools {
        pool,
        baas: BaasClient::new(reqwest::Client::new(), config.baas.clone()),
        email,
        password,
    })
}

async fn prompt(input: &mut Input, question: &str) -> Option<String> {
    print!("{}", question);
    std::io::stdout().flush().ok()?;
    input.next_line().await.ok().flatten().map(|l| l.trim().to_string())
}

async fn menu(tools: &Tools, input: &mut Input) {
    loop {
        println!("\n🔧 Herramientas para administrar el usuario admin\n");
        println!("1. Verificar usuario administrador");
        println!("2. Reiniciar usuario administrador (eliminar y recrear)");
        println!("3. Probar inicio de sesión");
        println!("4. Salir\n");

        let Some(answer) = prompt(input, "Selecciona una opción (1-4): ").await else {
            return;
        };
        match answer.as_str() {
            "1" => {
                check(tools).await;
            }
            "2" => {
                reset(tools, input).await;
            }
            "3" => {
                login(tools).await;
            }
            "4" => {
                println!("👋 ¡Adiós!");
                return;
            }
            _ => println!("⚠️ Opción no válida. Intenta de nuevo."),
        }
    }
}

async fn check(tools: &Tools) -> bool {
    println!("\n🔍 Verificando usuario administrador {}...", tools.email);
    let report = match admin_tools_service::check_admin_user(&tools.pool, &tools.baas, &tools.email).await {
        Ok(r) => r,
        Err(e) => {
            println!("❌ Error al verificar: {}", e);
            return false;
        }
    };

    match &report.auth_user {
        Some(user) => {
            println!("✅ Usuario de autenticación: {}", user.id);
            println!(
                "   Email confirmado: {}",
                if user.email_confirmed_at.is_some() { "sí" } else { "no" }
            );
            if let Some(at) = &user.last_sign_in_at {
                println!("   Último acceso: {}", at);
            }
        }
        None => println!("❌ No existe usuario de autenticación con ese email"),
    }
    match &report.profile {
        Some(profile) => println!(
            "✅ Perfil: {} (admin: {})",
            profile.name,
            if profile.is_admin { "sí" } else { "no" }
        ),
        None => println!("❌ No existe perfil para ese email"),
    }

    if report.is_healthy() {
        println!("\n🟢 El usuario administrador está listo");
    } else {
        println!("\n🟠 El usuario administrador necesita reiniciarse (opción 2 / comando reset)");
    }
    report.is_healthy()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "s" | "si" | "sí")
}

async fn reset(tools: &Tools, input: &mut Input) -> bool {
    let Some(password) = tools.password.as_deref() else {
        println!("❌ ADMIN_PASSWORD no está definido");
        return false;
    };
    let question = format!(
        "\n⚠️ Se eliminará y recreará el usuario {}. ¿Continuar? (s/n): ",
        tools.email
    );
    let confirmed = prompt(input, &question).await.map(|a| is_yes(&a)).unwrap_or(false);
    if !confirmed {
        println!("Operación cancelada");
        return false;
    }

    match admin_tools_service::reset_admin_user(&tools.pool, &tools.baas, &tools.email, password).await {
        Ok(user) => {
            println!("✅ Usuario administrador recreado: {}", user.id);
            true
        }
        Err(e) => {
            println!("❌ Error al reiniciar: {}", e);
            false
        }
    }
}

async fn login(tools: &Tools) -> bool {
    let Some(password) = tools.password.as_deref() else {
        println!("❌ ADMIN_PASSWORD no está definido");
        return false;
    };
    println!("\n🔑 Probando inicio de sesión con {}...", tools.email);
    match admin_tools_service::test_login(&tools.pool, &tools.baas, &tools.email, password).await {
        Ok(report) => {
            println!("✅ Sesión iniciada: {}", report.user_id);
            println!(
                "   Permisos de administrador: {}",
                if report.is_admin { "sí" } else { "no" }
            );
            report.is_admin
        }
        Err(e) => {
            println!("❌ Inicio de sesión fallido: {}", e);
            false
        }
    }
}
