//! Remote deployment to Windows hosts.
//!
//! Each component is a bundle of PowerShell commands run over ssh. Nothing
//! is mirrored first; the editor payload is copied with scp.
use super::policy::OutcomePolicy;
use super::{Context, RunReport, RunRequest, for_each_component};
use crate::config::machines::Machine;
use crate::config::vscode;
use crate::remote::Transport;

/// Package-name fragments removed by `debloat`.
pub const BLOATWARE: &[&str] = &[
    "Clipchamp.Clipchamp",
    "Microsoft.549981C3F5F10",
    "Microsoft.BingNews",
    "Microsoft.BingWeather",
    "Microsoft.BingFinance",
    "Microsoft.BingSports",
    "Microsoft.MicrosoftSolitaireCollection",
    "Microsoft.SkypeApp",
    "Microsoft.MixedReality.Portal",
    "Microsoft.YourPhone",
    "Microsoft.ZuneMusic",
    "Microsoft.ZuneVideo",
    "Microsoft.Copilot",
    "Microsoft.WindowsFeedbackHub",
    "Facebook",
    "Instagram",
    "TikTok",
    "Twitter",
    "LinkedIn",
    "king.com.CandyCrush",
    "king.com.CandyCrushSaga",
    "Netflix",
    "Spotify",
    "Amazon.com.Amazon",
    "McAfee",
    "Duolingo",
];

/// Registry writes applied by `telemetry`.
pub const TELEMETRY_COMMANDS: &[&str] = &[
    r"Set-ItemProperty -Path 'HKLM:\SOFTWARE\Policies\Microsoft\Windows\DataCollection' -Name 'AllowTelemetry' -Value 0 -Type DWord -Force -ErrorAction SilentlyContinue",
    r"New-Item -Path 'HKCU:\SOFTWARE\Microsoft\Windows\CurrentVersion\AdvertisingInfo' -Force -ErrorAction SilentlyContinue | Out-Null; Set-ItemProperty -Path 'HKCU:\SOFTWARE\Microsoft\Windows\CurrentVersion\AdvertisingInfo' -Name 'Enabled' -Value 0 -Type DWord -Force",
    r"New-Item -Path 'HKCU:\Software\Policies\Microsoft\Windows\WindowsCopilot' -Force -ErrorAction SilentlyContinue | Out-Null; Set-ItemProperty -Path 'HKCU:\Software\Policies\Microsoft\Windows\WindowsCopilot' -Name 'TurnOffWindowsCopilot' -Value 1 -Type DWord -Force",
    r"New-Item -Path 'HKCU:\SOFTWARE\Policies\Microsoft\Windows\Explorer' -Force -ErrorAction SilentlyContinue | Out-Null; Set-ItemProperty -Path 'HKCU:\SOFTWARE\Policies\Microsoft\Windows\Explorer' -Name 'DisableSearchBoxSuggestions' -Value 1 -Type DWord -Force",
    r"Set-ItemProperty -Path 'HKCU:\SOFTWARE\Microsoft\Windows\CurrentVersion\ContentDeliveryManager' -Name 'SystemPaneSuggestionsEnabled' -Value 0 -Type DWord -Force -ErrorAction SilentlyContinue",
    r"Set-ItemProperty -Path 'HKCU:\SOFTWARE\Microsoft\Windows\CurrentVersion\ContentDeliveryManager' -Name 'SubscribedContent-338388Enabled' -Value 0 -Type DWord -Force -ErrorAction SilentlyContinue",
];

const DISABLE_HIBERNATE: &str = "powercfg -h off";

/// Cursor size 150% with the black scheme.
const CURSOR_COMMANDS: &[&str] = &[
    r"Set-ItemProperty -Path 'HKCU:\Software\Microsoft\Accessibility' -Name 'CursorSize' -Value 3 -Type DWord -Force",
    r"Set-ItemProperty -Path 'HKCU:\Control Panel\Cursors' -Name 'CursorBaseSize' -Value 48 -Type DWord -Force",
    r"Set-ItemProperty -Path 'HKCU:\Control Panel\Cursors' -Name '(Default)' -Value 'Windows Black'",
];

const CHROME_INSTALL: &str =
    "winget install Google.Chrome --accept-package-agreements --accept-source-agreements --silent";

const VSCODE_INSTALL: &str = "winget install Microsoft.VisualStudioCode --accept-package-agreements --accept-source-agreements --silent";

const VSCODE_USER_DIR: &str =
    r"New-Item -ItemType Directory -Force -Path '$env:APPDATA\Code\User' | Out-Null";

/// Command that removes every package whose name contains `app`.
#[must_use]
pub fn remove_app_command(app: &str) -> String {
    format!(
        "Get-AppxPackage -Name '*{app}*' -AllUsers -ErrorAction SilentlyContinue | Remove-AppxPackage -AllUsers -ErrorAction SilentlyContinue"
    )
}

/// Command that installs editor extension `id`.
#[must_use]
pub fn install_extension_command(id: &str) -> String {
    format!(
        r"& 'C:\Program Files\Microsoft VS Code\bin\code.cmd' --install-extension {id} --force 2>$null"
    )
}

/// Remote path of an editor settings file for `user`.
#[must_use]
pub fn remote_settings_path(user: &str, file: &str) -> String {
    format!("C:/Users/{user}/AppData/Roaming/Code/User/{file}")
}

/// Deploy the selected Windows components to `machine`.
#[must_use]
pub fn deploy(machine: &Machine, request: &RunRequest, ctx: &Context) -> RunReport {
    let bundles = Bundles {
        ctx,
        machine,
        transport: Transport::new(machine, ctx.host_keys),
    };
    let mut report = RunReport::new(request.target());
    for_each_component(request, ctx, &mut report, |component| {
        ctx.say(&"=".repeat(50));
        ctx.say(&format!("Installing: {component}"));
        ctx.say(&"=".repeat(50));
        bundles.run(component)
    });
    report
}

struct Bundles<'a> {
    ctx: &'a Context,
    machine: &'a Machine,
    transport: Transport<'a>,
}

impl Bundles<'_> {
    fn run(&self, component: &str) -> bool {
        match component {
            "debloat" => self.debloat(),
            "telemetry" => self.telemetry(),
            "system" => self.system(),
            "chrome" => self.chrome(),
            "vscode" => self.vscode(),
            other => {
                self.ctx
                    .say(&format!("Error: unknown Windows component '{other}'"));
                false
            }
        }
    }

    fn ps(&self, script: &str) -> bool {
        self.ctx.exec(&self.transport.powershell(script))
    }

    fn debloat(&self) -> bool {
        self.ctx.say("Removing bloatware apps...");
        let removed = BLOATWARE
            .iter()
            .filter(|app| self.ps(&remove_app_command(app)))
            .count();
        self.ctx.say(&format!("Removed {removed} bloatware apps"));
        OutcomePolicy::BestEffort.resolve(removed == BLOATWARE.len())
    }

    fn telemetry(&self) -> bool {
        self.ctx.say("Disabling telemetry...");
        let applied = TELEMETRY_COMMANDS
            .iter()
            .filter(|cmd| self.ps(cmd))
            .count();
        tracing::debug!("{applied}/{} telemetry settings applied", TELEMETRY_COMMANDS.len());
        self.ctx.say("Telemetry, ads, and Copilot disabled");
        OutcomePolicy::BestEffort.resolve(applied == TELEMETRY_COMMANDS.len())
    }

    fn system(&self) -> bool {
        self.ctx.say("Disabling hibernate...");
        let mut all = self.ps(DISABLE_HIBERNATE);
        self.ctx.say("Setting cursor to black, 150%...");
        for cmd in CURSOR_COMMANDS {
            all &= self.ps(cmd);
        }
        self.ctx.say("System settings applied");
        OutcomePolicy::BestEffort.resolve(all)
    }

    fn chrome(&self) -> bool {
        self.ctx.say("Installing Chrome...");
        let policy = self.ctx.windows.chrome;
        let installed = self.ps(CHROME_INSTALL);
        if installed {
            self.ctx.say("Chrome installed");
        } else if policy.masks_failure() {
            self.ctx
                .say("Warning: Chrome install failed; Chrome may already be installed");
        } else {
            self.ctx.say("Error: Chrome install failed");
        }
        policy.resolve(installed)
    }

    fn vscode(&self) -> bool {
        self.ctx.say("Installing VSCode...");
        if self.ps(VSCODE_INSTALL) {
            self.ctx.say("VSCode installed");
        } else {
            self.ctx.say("VSCode may already be installed");
        }

        self.ctx.say("Copying VSCode settings...");
        self.ps(VSCODE_USER_DIR);
        let root = &self.ctx.root;
        let copied = [
            (vscode::settings_path(root), "settings.json"),
            (vscode::keybindings_path(root), "keybindings.json"),
        ]
        .iter()
        .map(|(local, file)| {
            let remote = remote_settings_path(&self.machine.user, file);
            self.ctx.exec(&self.transport.scp(local, &remote))
        })
        .fold(true, |all, ok| all && ok);
        if copied {
            self.ctx.say("Settings copied");
        } else {
            self.ctx.say("Warning: Could not copy settings");
        }

        self.ctx.say("Installing VSCode extensions...");
        let all_ok = self.install_extensions() && copied;
        OutcomePolicy::BestEffort.resolve(all_ok)
    }

    fn install_extensions(&self) -> bool {
        let path = vscode::extensions_path(&self.ctx.root);
        let Some(extensions) = vscode::load_extensions(&path) else {
            self.ctx
                .say(&format!("No extensions list at {}", path.display()));
            return false;
        };
        let limit = self.ctx.windows.extension_limit;
        let selected: Vec<&String> = extensions.iter().take(limit).collect();
        let failed = selected
            .iter()
            .filter(|id| !self.ps(&install_extension_command(id)))
            .count();
        self.ctx
            .say(&format!("Installed {} extensions", selected.len()));
        if failed > 0 {
            self.ctx
                .say(&format!("Warning: {failed} extension install(s) reported failure"));
        }
        if extensions.len() > selected.len() {
            self.ctx.say(&format!(
                "Skipped {} extensions beyond the limit of {limit}",
                extensions.len() - selected.len()
            ));
        }
        failed == 0
    }
}
