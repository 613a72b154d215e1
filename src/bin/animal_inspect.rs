//! 离线工具：不启动服务，直接为地址/摘要渲染头像或输出构成统计。
//!
//! 密钥默认从 `config.toml` / 环境变量（APP__ANIMAL__SEED）读取，避免出现在 shell history 中。

use std::fs;
use std::path::PathBuf;

use animal_backend::AppConfig;
use animal_backend::features::animal::{
    HashDigest, OutputFormat, RasterFormat, RasterSize, RenderOptions, address,
};
use animal_backend::startup::build_animal_service;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 最小日志：仅在需要调试时启用（例如 RUST_LOG=debug）。
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args = Args::parse(std::env::args().skip(1).collect());
    if args.help || (args.addresses.is_empty() && args.digest.is_none()) {
        print_help();
        return Ok(());
    }

    let config = match &args.config_path {
        Some(p) => AppConfig::load_from(p)?,
        None => AppConfig::load()?,
    };
    let service = build_animal_service(&config)?;

    let format = match args.format.as_str() {
        "svg" => OutputFormat::Svg,
        "png" => OutputFormat::Raster(RasterFormat::Png, RasterSize::new(args.size)?),
        "webp" => OutputFormat::Raster(RasterFormat::Webp, RasterSize::new(args.size)?),
        "stats" => {
            let prefix = config.animal.address_prefix.as_str();
            let mut valid = Vec::with_capacity(args.addresses.len());
            for raw in &args.addresses {
                let addr = address::parse(raw, prefix)
                    .ok_or_else(|| format!("Invalid address in address list {raw}"))?;
                valid.push(addr);
            }
            let report = service.stats(&valid);
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        other => return Err(format!("未知输出格式: {other}（svg|png|webp|stats）").into()),
    };
    let options = RenderOptions {
        format,
        with_background: args.background,
    };

    let rendered = match (&args.digest, args.addresses.first()) {
        (Some(hex), None) => service.render_digest(&HashDigest::from_hex(hex)?, options)?,
        (Some(hex), Some(raw)) => {
            let addr = address::parse(raw, &config.animal.address_prefix)
                .ok_or("Invalid address")?;
            service.render(addr, &HashDigest::from_hex(hex)?, options)?
        }
        (None, Some(raw)) => {
            let addr = address::parse(raw, &config.animal.address_prefix)
                .ok_or("Invalid address")?;
            service.render_address(addr, options)?
        }
        (None, None) => return Err("需要地址或 --digest".into()),
    };

    match args.out_path {
        Some(out) => {
            fs::write(&out, &rendered.bytes)?;
            println!(
                "已写入: {}（{}，{} 字节）",
                out.display(),
                rendered.content_type(),
                rendered.bytes.len()
            );
        }
        None if !format.is_raster() => {
            println!("{}", String::from_utf8_lossy(&rendered.bytes));
        }
        None => return Err("栅格输出需要 --out <path>".into()),
    }
    Ok(())
}

struct Args {
    help: bool,
    format: String,
    size: u32,
    background: bool,
    digest: Option<String>,
    config_path: Option<PathBuf>,
    out_path: Option<PathBuf>,
    addresses: Vec<String>,
}

impl Args {
    fn parse(argv: Vec<String>) -> Self {
        let mut args = Self {
            help: false,
            format: "svg".to_string(),
            size: RasterSize::DEFAULT.get(),
            background: false,
            digest: None,
            config_path: None,
            out_path: None,
            addresses: Vec::new(),
        };

        let mut it = argv.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "-h" | "--help" => args.help = true,
                "--format" => {
                    if let Some(v) = it.next() {
                        args.format = v.to_ascii_lowercase();
                    }
                }
                "--size" => {
                    if let Some(v) = it.next() {
                        args.size = v.parse().unwrap_or(0);
                    }
                }
                "--background" => args.background = true,
                "--digest" => args.digest = it.next(),
                "--config" => args.config_path = it.next().map(PathBuf::from),
                "--out" => args.out_path = it.next().map(PathBuf::from),
                _ => args.addresses.push(a),
            }
        }
        args
    }
}

fn print_help() {
    println!(
        r#"animal_inspect（离线头像工具）

用法：
  cargo run --bin animal_inspect -- paw_1... --format png --size 256 --out a.png
  cargo run --bin animal_inspect -- --format stats paw_1... paw_3...
  cargo run --bin animal_inspect -- --digest <128 位十六进制> --format svg

常用参数：
  --format svg|png|webp|stats   输出格式（默认 svg，stats 输出 JSON 构成统计）
  --size N                      栅格边长 100..=1000（默认 128）
  --background                  绘制背景
  --digest HEX                  直接指定 64 字节摘要（与地址同时给出时地址仅用于 vanity 查找）
  --config PATH                 配置文件（默认 ./config.toml）
  --out PATH                    写入文件（栅格输出必填）"#
    );
}
