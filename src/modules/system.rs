//! Local system facts: host, OS, uptime, load, memory, shell
//!
//! Everything comes from procfs and `/etc`, so on systems without them the
//! matching lines are simply left out.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Module, ModuleError};
use crate::color::{Colorizer, Tone};
use crate::config::{Config, SystemConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryInfo {
    pub total_kib: u64,
    pub available_kib: u64,
}

impl MemoryInfo {
    pub fn used_kib(&self) -> u64 {
        self.total_kib.saturating_sub(self.available_kib)
    }

    pub fn used_percent(&self) -> f64 {
        if self.total_kib == 0 {
            return 0.0;
        }
        self.used_kib() as f64 * 100.0 / self.total_kib as f64
    }
}

/// What could be learned about the machine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemInfo {
    pub hostname: Option<String>,
    pub os: Option<String>,
    pub kernel: Option<String>,
    pub uptime: Option<Duration>,
    pub load: Option<[f64; 3]>,
    pub memory: Option<MemoryInfo>,
    pub shell: Option<String>,
}

pub struct SystemModule {
    /// Filesystem root the proc and etc files are read from
    root: PathBuf,
}

impl SystemModule {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read(&self, relative: &str) -> Option<String> {
        tokio::fs::read_to_string(self.root.join(relative)).await.ok()
    }

    pub async fn collect(&self) -> SystemInfo {
        let hostname = self
            .read("etc/hostname")
            .await
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok());

        SystemInfo {
            hostname,
            os: self.read("etc/os-release").await.and_then(|s| parse_os_release(&s)),
            kernel: self
                .read("proc/sys/kernel/osrelease")
                .await
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            uptime: self.read("proc/uptime").await.and_then(|s| parse_uptime(&s)),
            load: self.read("proc/loadavg").await.and_then(|s| parse_loadavg(&s)),
            memory: self.read("proc/meminfo").await.and_then(|s| parse_meminfo(&s)),
            shell: std::env::var("SHELL").ok().as_deref().and_then(shell_name),
        }
    }
}

impl Default for SystemModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for SystemModule {
    fn name(&self) -> &str {
        "system"
    }

    async fn setup(&mut self, _config: &Config) -> Result<(), ModuleError> {
        Ok(())
    }

    async fn display(&self, config: &Config) -> Result<String, ModuleError> {
        let info = self.collect().await;
        let colors = Colorizer::from_config(config.display.colors);
        Ok(render(&info, &config.system, &colors))
    }
}

/// Renders the system fragment; returns an empty string when nothing is known
pub fn render(info: &SystemInfo, show: &SystemConfig, colors: &Colorizer) -> String {
    let mut rows: Vec<(&str, String)> = Vec::new();

    if show.show_hostname {
        if let Some(host) = &info.hostname {
            rows.push(("Host", host.clone()));
        }
    }
    if show.show_os {
        if let Some(os) = &info.os {
            rows.push(("OS", os.clone()));
        }
    }
    if show.show_kernel {
        if let Some(kernel) = &info.kernel {
            rows.push(("Kernel", kernel.clone()));
        }
    }
    if show.show_uptime {
        if let Some(uptime) = info.uptime {
            rows.push(("Uptime", format_uptime(uptime)));
        }
    }
    if show.show_load {
        if let Some([one, five, fifteen]) = info.load {
            rows.push(("Load", format!("{:.2} {:.2} {:.2}", one, five, fifteen)));
        }
    }
    if show.show_memory {
        if let Some(memory) = info.memory {
            rows.push(("Memory", format_memory(&memory)));
        }
    }
    if show.show_shell {
        if let Some(shell) = &info.shell {
            rows.push(("Shell", shell.clone()));
        }
    }

    if rows.is_empty() {
        return String::new();
    }

    let mut lines = vec![colors.paint(Tone::Title, "System")];
    lines.extend(rows.into_iter().map(|(label, value)| {
        format!("  {} {}", colors.paint(Tone::Muted, format!("{:<8}", label)), value)
    }));
    lines.join("\n")
}

/// `PRETTY_NAME` from os-release, else `NAME VERSION`
pub fn parse_os_release(content: &str) -> Option<String> {
    let field = |key: &str| {
        content.lines().find_map(|line| {
            let value = line.strip_prefix(key)?.strip_prefix('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| value.to_string())
        })
    };

    field("PRETTY_NAME").or_else(|| match (field("NAME"), field("VERSION")) {
        (Some(name), Some(version)) => Some(format!("{} {}", name, version)),
        (name, _) => name,
    })
}

/// First field of `/proc/uptime`, in seconds
pub fn parse_uptime(content: &str) -> Option<Duration> {
    let seconds: f64 = content.split_whitespace().next()?.parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs(seconds as u64))
}

/// 1, 5 and 15 minute averages from `/proc/loadavg`
pub fn parse_loadavg(content: &str) -> Option<[f64; 3]> {
    let mut fields = content.split_whitespace().map(|f| f.parse::<f64>().ok());
    Some([fields.next()??, fields.next()??, fields.next()??])
}

/// `MemTotal` and `MemAvailable` from `/proc/meminfo`
pub fn parse_meminfo(content: &str) -> Option<MemoryInfo> {
    let field = |key: &str| {
        content.lines().find_map(|line| {
            let rest = line.strip_prefix(key)?.strip_prefix(':')?;
            rest.split_whitespace().next()?.parse::<u64>().ok()
        })
    };

    let total_kib = field("MemTotal")?;
    let available_kib = field("MemAvailable")
        .or_else(|| Some(field("MemFree")? + field("Buffers").unwrap_or(0) + field("Cached").unwrap_or(0)))?;
    Some(MemoryInfo {
        total_kib,
        available_kib,
    })
}

/// `/usr/bin/zsh` -> `zsh`
pub fn shell_name(path: &str) -> Option<String> {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// `3d 4h 12m`, dropping leading zero units
pub fn format_uptime(uptime: Duration) -> String {
    let total_minutes = uptime.as_secs() / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    match (days, hours) {
        (0, 0) => format!("{}m", minutes),
        (0, _) => format!("{}h {}m", hours, minutes),
        _ => format!("{}d {}h {}m", days, hours, minutes),
    }
}

fn format_memory(memory: &MemoryInfo) -> String {
    const KIB_PER_GIB: f64 = 1024.0 * 1024.0;
    format!(
        "{:.1} / {:.1} GiB ({:.0}%)",
        memory.used_kib() as f64 / KIB_PER_GIB,
        memory.total_kib as f64 / KIB_PER_GIB,
        memory.used_percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MEMINFO: &str = "MemTotal:       16384000 kB\n\
                           MemFree:         1000000 kB\n\
                           MemAvailable:    8192000 kB\n\
                           Buffers:          200000 kB\n";

    fn fake_root() -> TempDir {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("etc")).unwrap();
        fs::create_dir_all(root.path().join("proc/sys/kernel")).unwrap();
        fs::write(root.path().join("etc/hostname"), "devbox\n").unwrap();
        fs::write(
            root.path().join("etc/os-release"),
            "NAME=\"Ubuntu\"\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\n",
        )
        .unwrap();
        fs::write(root.path().join("proc/sys/kernel/osrelease"), "6.8.0-31-generic\n").unwrap();
        fs::write(root.path().join("proc/uptime"), "273120.55 1000000.00\n").unwrap();
        fs::write(root.path().join("proc/loadavg"), "0.52 0.48 0.40 1/523 12345\n").unwrap();
        fs::write(root.path().join("proc/meminfo"), MEMINFO).unwrap();
        root
    }

    #[test]
    fn test_parse_os_release() {
        assert_eq!(
            parse_os_release("NAME=Fedora\nPRETTY_NAME=\"Fedora Linux 40\"\n").as_deref(),
            Some("Fedora Linux 40")
        );
        assert_eq!(
            parse_os_release("NAME=\"Alpine\"\nVERSION=\"3.20\"\n").as_deref(),
            Some("Alpine 3.20")
        );
        assert_eq!(parse_os_release("ID=arch\n"), None);
    }

    #[test]
    fn test_parse_uptime_and_load() {
        assert_eq!(parse_uptime("3600.99 10.0"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_uptime("garbage"), None);
        assert_eq!(parse_loadavg("1.00 0.50 0.25 2/100 1"), Some([1.0, 0.5, 0.25]));
        assert_eq!(parse_loadavg("1.00 0.50"), None);
    }

    #[test]
    fn test_parse_meminfo() {
        let memory = parse_meminfo(MEMINFO).unwrap();
        assert_eq!(memory.total_kib, 16_384_000);
        assert_eq!(memory.available_kib, 8_192_000);
        assert!((memory.used_percent() - 50.0).abs() < 0.01);

        let without_available = "MemTotal: 1000 kB\nMemFree: 100 kB\nCached: 50 kB\n";
        assert_eq!(parse_meminfo(without_available).unwrap().available_kib, 150);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "0m");
        assert_eq!(format_uptime(Duration::from_secs(2 * 3600 + 5 * 60)), "2h 5m");
        assert_eq!(format_uptime(Duration::from_secs(273_120)), "3d 3h 52m");
    }

    #[test]
    fn test_shell_name() {
        assert_eq!(shell_name("/usr/bin/zsh").as_deref(), Some("zsh"));
        assert_eq!(shell_name("/"), None);
    }

    #[tokio::test]
    async fn test_collect_reads_fake_root() {
        let root = fake_root();
        let info = SystemModule::with_root(root.path()).collect().await;

        assert_eq!(info.hostname.as_deref(), Some("devbox"));
        assert_eq!(info.os.as_deref(), Some("Ubuntu 24.04 LTS"));
        assert_eq!(info.kernel.as_deref(), Some("6.8.0-31-generic"));
        assert_eq!(info.uptime, Some(Duration::from_secs(273_120)));
        assert_eq!(info.load, Some([0.52, 0.48, 0.40]));
    }

    #[tokio::test]
    async fn test_collect_on_empty_root_knows_nothing_from_files() {
        let root = TempDir::new().unwrap();
        let info = SystemModule::with_root(root.path()).collect().await;

        assert!(info.os.is_none());
        assert!(info.uptime.is_none());
        assert!(info.memory.is_none());
    }

    #[test]
    fn test_render_respects_toggles() {
        let info = SystemInfo {
            hostname: Some("devbox".to_string()),
            uptime: Some(Duration::from_secs(3600)),
            shell: Some("zsh".to_string()),
            ..Default::default()
        };
        let show = SystemConfig {
            show_shell: false,
            ..Default::default()
        };

        let rendered = render(&info, &show, &Colorizer::plain());

        assert_eq!(rendered, "System\n  Host     devbox\n  Uptime   1h 0m");
    }

    #[test]
    fn test_render_nothing_known_is_empty() {
        let rendered = render(&SystemInfo::default(), &SystemConfig::default(), &Colorizer::plain());
        assert!(rendered.is_empty());
    }
}
