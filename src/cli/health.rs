//! `medassist health` - probe every generation and memory backend

use crate::bootstrap::Services;
use anyhow::Result;

pub async fn run(services: &Services) -> Result<()> {
    println!("MedAssist health\n");

    let generation = services.gateway.health_check_all().await;
    println!("Generation backends:");
    if generation.is_empty() {
        println!("  (none registered)");
    }
    for health in &generation {
        let mark = if health.alive { "ok  " } else { "DOWN" };
        let mut line = format!("  {mark} {} ({})", health.backend, health.model);
        if health.medical_validated {
            line.push_str(" medical-validated");
        }
        if health.hipaa_compliant {
            line.push_str(" hipaa");
        }
        if let Some(error) = &health.error {
            line.push_str(&format!(" - {error}"));
        }
        println!("{line}");
    }

    let memory = services.memory.health_summary().await;
    println!("\nMemory backends:");
    for (kind, alive) in &memory.backends {
        let mark = if *alive { "ok  " } else { "DOWN" };
        println!("  {mark} {kind}");
    }

    let generation_ok = generation.iter().any(|h| h.alive);
    println!();
    if generation_ok && memory.overall {
        println!("All systems reachable.");
        Ok(())
    } else {
        println!("Some systems are unreachable; replies may be degraded.");
        std::process::exit(1);
    }
}
