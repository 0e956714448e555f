//! alac-cli - ALAC 流式编解码命令行工具
//!
//! 把原始 PCM 文件编码为 ALAC 裸数据包流 (附 JSON 描述文件), 或反向解码.

mod commands;
mod descriptor;
mod logging;

use std::path::{Path, PathBuf};
use std::process;

use alac_stream::EncoderOptions;
use clap::{Args, Parser, Subcommand};

use commands::{DEFAULT_CHUNK_SIZE, DecodeJob, EncodeJob};

#[derive(Parser, Debug)]
#[command(name = "alac-cli", version, about = "ALAC 流式编解码工具")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 覆盖输出文件
    #[arg(short = 'y', long, global = true)]
    overwrite: bool,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// PCM (小端交错) 编码为 ALAC 数据包流
    Encode(EncodeArgs),
    /// ALAC 数据包流解码为 PCM
    Decode(DecodeArgs),
    /// 显示描述文件信息
    Inspect {
        /// 描述文件路径
        #[arg(short, long)]
        descriptor: PathBuf,
    },
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// 输入 PCM 文件
    #[arg(short, long)]
    input: PathBuf,

    /// 输出数据包文件
    #[arg(short, long)]
    output: PathBuf,

    /// 输出描述文件 (默认为输出文件名加 .json)
    #[arg(short, long)]
    descriptor: Option<PathBuf>,

    /// 采样率 (Hz)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// 声道数
    #[arg(long)]
    channels: Option<u32>,

    /// 位深 (16/20/24/32)
    #[arg(long)]
    bit_depth: Option<u32>,

    /// 每包帧数
    #[arg(long)]
    frames_per_packet: Option<u32>,

    /// 每次读取的字节数
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// 输入数据包文件
    #[arg(short, long)]
    input: PathBuf,

    /// 输出 PCM 文件
    #[arg(short, long)]
    output: PathBuf,

    /// 描述文件 (默认为输入文件名加 .json)
    #[arg(short, long)]
    descriptor: Option<PathBuf>,

    /// 每次读取的字节数
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init("alac-cli", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    if let Err(e) = run(&cli) {
        log::error!("{e:#}");
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Encode(args) => {
            let descriptor = args
                .descriptor
                .clone()
                .unwrap_or_else(|| sidecar_path(&args.output));
            commands::check_overwrite(&args.output, cli.overwrite)?;
            commands::check_overwrite(&descriptor, cli.overwrite)?;

            eprintln!("alac-cli 版本 {}", alac_stream::version());
            eprintln!("输入: {}", args.input.display());
            eprintln!("输出: {}", args.output.display());

            let desc = commands::encode(&EncodeJob {
                input: &args.input,
                output: &args.output,
                descriptor: &descriptor,
                options: EncoderOptions {
                    sample_rate: args.sample_rate,
                    channels: args.channels,
                    bit_depth: args.bit_depth,
                    frames_per_packet: args.frames_per_packet,
                },
                chunk_size: args.chunk_size,
            })?;
            eprintln!(
                "完成: {} 个数据包, {} 字节, 描述文件 {}",
                desc.packet_lengths.len(),
                desc.compressed_bytes(),
                descriptor.display(),
            );
        }
        Command::Decode(args) => {
            let descriptor = args
                .descriptor
                .clone()
                .unwrap_or_else(|| sidecar_path(&args.input));
            commands::check_overwrite(&args.output, cli.overwrite)?;

            let bytes = commands::decode(&DecodeJob {
                input: &args.input,
                output: &args.output,
                descriptor: &descriptor,
                chunk_size: args.chunk_size,
            })?;
            eprintln!("完成: 输出 {bytes} 字节 PCM 到 {}", args.output.display());
        }
        Command::Inspect { descriptor } => {
            println!("{}", commands::inspect(descriptor)?);
        }
    }
    Ok(())
}

/// `out.alac` -> `out.alac.json`
fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_encode_args() {
        let cli = Cli::try_parse_from([
            "alac-cli",
            "encode",
            "-i",
            "a.pcm",
            "-o",
            "a.alac",
            "--sample-rate",
            "48000",
            "--channels",
            "2",
            "--bit-depth",
            "24",
            "-y",
            "-vv",
        ])
        .unwrap();
        assert!(cli.overwrite);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.sample_rate, Some(48000));
                assert_eq!(args.frames_per_packet, None);
                assert_eq!(args.chunk_size, DEFAULT_CHUNK_SIZE);
            }
            other => panic!("期望 encode, 实际 {other:?}"),
        }
    }

    #[test]
    fn test_default_descriptor_path() {
        assert_eq!(
            sidecar_path(Path::new("dir/out.alac")),
            PathBuf::from("dir/out.alac.json")
        );
    }
}
