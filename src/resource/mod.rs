//! Resource and item management commands

use anyhow::Result;
use colored::Colorize;

use crate::archive::Archive;
use crate::archive::models::{
    RecordDraft, RecordUpdate, Resource, ResourceKind, ResourceMeta, ResourceUpdate,
};
use crate::cli::{GlobalArgs, ItemAction, ItemArgs, ResourceAction, ResourceArgs};
use crate::config::Config;
use crate::utils::truncate_display;

fn open_archive(global: &GlobalArgs) -> Result<(Archive, Config)> {
    let cfg = Config::load().unwrap_or_default();
    let archive = Archive::open(cfg.database_path(global.db.as_deref())?)?;
    Ok((archive, cfg))
}

pub fn run(args: ResourceArgs, global: &GlobalArgs) -> Result<()> {
    let (archive, cfg) = open_archive(global)?;

    match args.action {
        ResourceAction::List { kind } => list_resources(&archive, kind.map(ResourceKind::from)),
        ResourceAction::Show { id, items } => show_resource(&archive, id, items),
        ResourceAction::Create {
            title,
            kind,
            notes,
            field,
            client,
            translator,
        } => {
            let meta = ResourceMeta {
                notes: notes.unwrap_or_default(),
                field: field.unwrap_or_default(),
                client: client.unwrap_or_default(),
                translator: translator.unwrap_or_default(),
            };
            let actor = cfg.actor(global.actor.as_deref());
            create_resource(&archive, &title, kind.into(), &meta, &actor)
        }
        ResourceAction::Update {
            id,
            title,
            notes,
            field,
            client,
            translator,
        } => {
            let update = ResourceUpdate {
                title,
                notes,
                field,
                client,
                translator,
            };
            let actor = cfg.actor(global.actor.as_deref());
            update_resource(&archive, id, update, &actor)
        }
        ResourceAction::Delete { id } => delete_resource(&archive, id),
    }
}

pub fn run_item(args: ItemArgs, global: &GlobalArgs) -> Result<()> {
    let (archive, cfg) = open_archive(global)?;

    match args.action {
        ItemAction::Add {
            resource_id,
            source,
            target,
            notes,
        } => {
            if source.is_empty() {
                anyhow::bail!("Source text cannot be empty");
            }
            if archive.get_resource(resource_id)?.is_none() {
                anyhow::bail!("Resource not found: {}", resource_id);
            }
            let actor = cfg.actor(global.actor.as_deref());
            let record = archive.add_item(
                resource_id,
                &RecordDraft::new(source, target).with_notes(notes),
                &actor,
            )?;
            println!(
                "{}",
                format!("[OK] Added item #{} to resource #{}", record.id, resource_id).green()
            );
            Ok(())
        }
        ItemAction::Update {
            id,
            source,
            target,
            notes,
        } => {
            let update = RecordUpdate {
                source,
                target,
                notes,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update: pass --source, --target or --notes");
            }
            if update.source.as_deref() == Some("") {
                anyhow::bail!("Source text cannot be empty");
            }
            let actor = cfg.actor(global.actor.as_deref());
            let record = archive
                .update_item(id, &update, &actor)?
                .ok_or_else(|| anyhow::anyhow!("Item not found: {}", id))?;
            println!(
                "{}",
                format!("[OK] Updated item #{} in resource #{}", record.id, record.resource_id)
                    .green()
            );
            Ok(())
        }
        ItemAction::Delete { id } => {
            if !archive.delete_item(id)? {
                anyhow::bail!("Item not found: {}", id);
            }
            println!("{}", format!("[OK] Deleted item #{}", id).green());
            Ok(())
        }
    }
}

fn list_resources(archive: &Archive, kind: Option<ResourceKind>) -> Result<()> {
    let resources = archive.list_resources(kind)?;

    println!("{}", format!("[Resources] {} found", resources.len()).green());
    for resource in &resources {
        println!(
            "  {:>5}  {:<12} {:<40} {:>6} item(s)",
            format!("#{}", resource.id).cyan(),
            resource.kind,
            truncate_display(&resource.title, 40),
            archive.count_items(resource.id)?
        );
    }

    Ok(())
}

fn print_resource(resource: &Resource, item_count: usize) {
    println!("{}", format!("[{}] {}", resource.kind, resource.title).green());
    println!("  Id:         {}", resource.id);
    println!("  Items:      {}", item_count);
    for (label, value) in [
        ("Field", &resource.field),
        ("Client", &resource.client),
        ("Translator", &resource.translator),
    ] {
        if !value.is_empty() {
            println!("  {:<11} {}", format!("{}:", label), value);
        }
    }
    println!(
        "  Created:    {} by {}",
        resource.created_on.format("%Y-%m-%d %H:%M:%S"),
        resource.created_by
    );
    println!(
        "  Updated:    {} by {}",
        resource.updated_on.format("%Y-%m-%d %H:%M:%S"),
        resource.updated_by
    );
    if !resource.notes.is_empty() {
        println!("  Notes:");
        for line in resource.notes.lines() {
            println!("    {}", line.dimmed());
        }
    }
}

fn show_resource(archive: &Archive, id: i64, with_items: bool) -> Result<()> {
    let resource = archive
        .get_resource(id)?
        .ok_or_else(|| anyhow::anyhow!("Resource not found: {}", id))?;
    let items = archive.items(id)?;

    print_resource(&resource, items.len());

    if with_items {
        println!();
        for item in &items {
            println!(
                "  {} {}\t{}",
                format!("#{}", item.id).cyan(),
                item.source,
                item.target
            );
            if !item.notes.is_empty() {
                println!("      {}", item.notes.dimmed());
            }
        }
    }

    Ok(())
}

fn create_resource(
    archive: &Archive,
    title: &str,
    kind: ResourceKind,
    meta: &ResourceMeta,
    actor: &str,
) -> Result<()> {
    let title = title.trim();
    ensure_title_free(archive, title, kind, None)?;

    let resource = archive.create_resource(title, kind, meta, actor)?;
    println!(
        "{}",
        format!(
            "[OK] Created {} #{} \"{}\"",
            resource.kind, resource.id, resource.title
        )
        .green()
    );

    Ok(())
}

/// Titles are unique per kind, ignoring case. `except` is the resource being
/// renamed, which may keep its own title in a different case.
fn ensure_title_free(
    archive: &Archive,
    title: &str,
    kind: ResourceKind,
    except: Option<i64>,
) -> Result<()> {
    if title.is_empty() {
        anyhow::bail!("Title cannot be empty");
    }
    match archive.find_resource(title, kind)? {
        Some(existing) if Some(existing.id) != except => {
            anyhow::bail!("A {} titled \"{}\" already exists", kind, title)
        }
        _ => Ok(()),
    }
}

fn update_resource(
    archive: &Archive,
    id: i64,
    mut update: ResourceUpdate,
    actor: &str,
) -> Result<()> {
    if update.is_empty() {
        anyhow::bail!("Nothing to update: pass --title, --notes, --field, --client or --translator");
    }
    let resource = archive
        .get_resource(id)?
        .ok_or_else(|| anyhow::anyhow!("Resource not found: {}", id))?;

    if let Some(title) = update.title.take() {
        let title = title.trim().to_string();
        ensure_title_free(archive, &title, resource.kind, Some(id))?;
        update.title = Some(title);
    }

    let updated = archive
        .update_resource(id, &update, actor)?
        .ok_or_else(|| anyhow::anyhow!("Resource not found: {}", id))?;
    tracing::info!("Updated resource {} by {}", id, actor);
    println!(
        "{}",
        format!(
            "[OK] Updated {} #{} \"{}\"",
            updated.kind, updated.id, updated.title
        )
        .green()
    );

    Ok(())
}

fn delete_resource(archive: &Archive, id: i64) -> Result<()> {
    let resource = archive
        .get_resource(id)?
        .ok_or_else(|| anyhow::anyhow!("Resource not found: {}", id))?;
    let count = archive.count_items(id)?;

    archive.delete_resource(id)?;
    tracing::info!("Deleted resource {} with {} item(s)", id, count);
    println!(
        "{}",
        format!(
            "[OK] Deleted {} #{} \"{}\" and {} item(s)",
            resource.kind, resource.id, resource.title, count
        )
        .green()
    );

    Ok(())
}
