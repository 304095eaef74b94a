use anyhow::Result;
use sqlx::PgPool;

struct SeedModule<'a> {
    id: &'a str,
    title: &'a str,
    category: &'a str,
}

const MODULES: &[SeedModule<'static>] = &[
    SeedModule { id: "fundamentos-1", title: "Despertar da Consciência", category: "Fundamentos" },
    SeedModule { id: "fundamentos-2", title: "Mapa de Crenças", category: "Fundamentos" },
    SeedModule { id: "fundamentos-3", title: "Rotina Essencial", category: "Fundamentos" },
    SeedModule { id: "fundamentos-4", title: "Compromisso Pessoal", category: "Fundamentos" },
    SeedModule { id: "pratica-1", title: "Protocolo de Renovação", category: "Prática" },
    SeedModule { id: "pratica-2", title: "Diário de Reflexões", category: "Prática" },
    SeedModule { id: "pratica-3", title: "Hábitos de Energia", category: "Prática" },
    SeedModule { id: "pratica-4", title: "Metas da Semana", category: "Prática" },
    SeedModule { id: "avancado-1", title: "Autodomínio", category: "Avançado" },
    SeedModule { id: "avancado-2", title: "Relações Conscientes", category: "Avançado" },
    SeedModule { id: "avancado-3", title: "Propósito", category: "Avançado" },
    SeedModule { id: "avancado-4", title: "Legado", category: "Avançado" },
];

pub async fn seed_all(pool: &PgPool, admin_email: Option<&str>) -> Result<()> {
    seed_modules(pool).await?;
    if let Some(email) = admin_email {
        seed_admin(pool, email).await?;
    }
    Ok(())
}

async fn seed_modules(pool: &PgPool) -> Result<()> {
    for (idx, module) in MODULES.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO funnel_modules (id, title, category, order_index)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(module.id)
        .bind(module.title)
        .bind(module.category)
        .bind(idx as i32 + 1)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Grants admin to an existing profile. Never re-activates a revoked grant.
async fn seed_admin(pool: &PgPool, email: &str) -> Result<()> {
    let granted = sqlx::query(
        r#"
        INSERT INTO admin_users (user_id, is_active)
        SELECT id, true FROM user_profiles WHERE lower(email) = lower($1)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(email.trim())
    .execute(pool)
    .await?
    .rows_affected();

    if granted > 0 {
        tracing::info!("Granted admin access to {}", email);
    } else {
        tracing::debug!("Admin bootstrap skipped for {} (missing profile or existing grant)", email);
    }
    Ok(())
}
