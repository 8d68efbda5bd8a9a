use super::*;
use crate::context::AppContext;
use crate::format::{self, OutputFormat};
use libstrata::QemuImg;
use tracing::info;

fn exit_with(ctx: &AppContext, message: &str) -> ! {
    ctx.out.error(message);
    std::process::exit(1);
}

fn open_registry(ctx: &AppContext) -> Registry {
    ctx.registry().unwrap_or_else(|e| exit_with(ctx, &e))
}

fn print_formatted(ctx: &AppContext, result: Result<String, String>) {
    match result {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => exit_with(ctx, &e),
    }
}

/// Handle the image list command
pub fn handle_image_list(ctx: &AppContext, format: OutputFormat, quiet: bool, repo: Option<&str>) {
    info!(repo = ?repo, "Listing images");
    let mut registry = open_registry(ctx);

    let images = list_images(&mut registry, repo).unwrap_or_else(|e| exit_with(ctx, &e));

    // Handle quiet mode
    if quiet {
        for image in images {
            println!("{}", image.name);
        }
        return;
    }

    if images.is_empty() && format == OutputFormat::Pretty {
        println!("No images found.");
        return;
    }

    print_formatted(ctx, format::format_table(&images, format));
}

/// Handle the image show command
pub fn handle_image_show(ctx: &AppContext, name: &str, format: OutputFormat) {
    let mut registry = open_registry(ctx);
    let details = image_details(&mut registry, name).unwrap_or_else(|e| exit_with(ctx, &e));
    print_formatted(ctx, format::format_output(&details, format));
}

/// Handle the image import command
pub fn handle_image_import(
    ctx: &AppContext,
    file: &Path,
    options: ImportOptions,
    qemu_img: &Path,
    format: OutputFormat,
) {
    if !file.is_file() {
        exit_with(ctx, &format!("No such file: {}", file.display()));
    }

    let mut registry = open_registry(ctx);
    let backend = QemuImg::with_binary(qemu_img);

    let spinner = ctx
        .out
        .spinner(&format!("Importing {} (hashing contents)...", file.display()));
    let result = import_image(&mut registry, &backend, file, options);

    match result {
        Ok(imported) => match format {
            OutputFormat::Pretty => ctx.out.finish_progress(spinner, &imported.format_pretty()),
            _ => {
                spinner.finish_and_clear();
                print_formatted(ctx, format::format_output(&imported, format));
            }
        },
        Err(e) => {
            spinner.finish_and_clear();
            exit_with(ctx, &e);
        }
    }
}

/// Handle the image tag command
pub fn handle_image_tag(ctx: &AppContext, tag: &str, name: &str) {
    let mut registry = open_registry(ctx);
    match tag_image(&mut registry, tag, name) {
        Ok(qualified) => ctx.out.success(&format!("Tagged {} as {}", name, qualified)),
        Err(e) => exit_with(ctx, &e),
    }
}

/// Handle the image ancestors command
pub fn handle_image_ancestors(ctx: &AppContext, name: &str, format: OutputFormat) {
    let mut registry = open_registry(ctx);
    let chain = ancestors(&mut registry, name).unwrap_or_else(|e| exit_with(ctx, &e));
    print_formatted(ctx, format::format_table(&chain, format));
}
