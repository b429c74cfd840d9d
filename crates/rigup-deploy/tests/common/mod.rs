//! Shared fakes for deployment-flow tests

// Each integration test compiles its own copy; not every test uses every fake.
#![allow(dead_code)]

use async_trait::async_trait;
use rigup_cloud::{
    AttachedDroplet, CloudApi, CloudError, CreateDropletRequest, CreateVolumeRequest, Droplet,
    DropletNetworks, FloatingIp, NetworkV4, Region, Volume,
};
use rigup_deploy::interact::Interaction;
use rigup_deploy::ssh::{ExecOutput, RemoteShell, SshError};
use rigup_core::{DeploymentDefinition, DropletSpec, RuntimeSpec, VolumeSpec};
use std::collections::VecDeque;
use std::sync::Mutex;

// ============ Definition builder ============

pub fn definition() -> DeploymentDefinition {
    DeploymentDefinition {
        domain: "graphics.example.com".to_string(),
        email: "ops@example.com".to_string(),
        secure: false,
        droplet: DropletSpec {
            region: "nyc1".to_string(),
            size: "s-1vcpu-2gb".to_string(),
            image: "ubuntu-24-04-x64".to_string(),
            floating_ip: None,
        },
        volume: VolumeSpec {
            id: None,
            name: None,
            size_gigabytes: None,
        },
        runtime: RuntimeSpec {
            version: semver::VersionReq::parse("*").unwrap(),
            version_range: "*".to_string(),
            config: serde_json::Map::new(),
            port: 9090,
        },
        bundles: Vec::new(),
        file_path: std::path::PathBuf::from("deployment.yml"),
    }
}

pub fn region(slug: &str, storage: bool) -> Region {
    let mut features = vec!["backups".to_string()];
    if storage {
        features.push("storage".to_string());
    }
    Region {
        slug: slug.to_string(),
        name: format!("Region {slug}"),
        features,
        available: true,
    }
}

pub fn droplet(id: u64, name: &str, region: &str) -> Droplet {
    Droplet {
        id,
        name: name.to_string(),
        region: region.to_string(),
        status: "active".to_string(),
        networks: DropletNetworks {
            v4: vec![NetworkV4 {
                ip_address: format!("203.0.113.{id}"),
                kind: "public".to_string(),
            }],
        },
    }
}

pub fn volume(id: &str, name: &str, region: &str, droplet_ids: &[u64]) -> Volume {
    Volume {
        id: id.to_string(),
        name: name.to_string(),
        region: region.to_string(),
        size_gigabytes: 40,
        droplet_ids: droplet_ids.to_vec(),
    }
}

pub fn floating_ip(ip: &str, region: &str, attached: Option<(u64, &str)>) -> FloatingIp {
    FloatingIp {
        ip: ip.to_string(),
        region: region.to_string(),
        droplet: attached.map(|(id, name)| AttachedDroplet {
            id,
            name: name.to_string(),
        }),
    }
}

// ============ Fake cloud provider ============

#[derive(Default)]
pub struct CloudState {
    pub regions: Vec<Region>,
    pub droplets: Vec<Droplet>,
    pub volumes: Vec<Volume>,
    pub floating_ips: Vec<FloatingIp>,
    /// Mutating calls in issue order, e.g. `delete_droplet:8`.
    pub calls: Vec<String>,
    pub next_droplet_id: u64,
    pub next_ip_octet: u8,
}

pub struct FakeCloud {
    pub state: Mutex<CloudState>,
}

impl FakeCloud {
    pub fn new(state: CloudState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_issued(&self, prefix: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .any(|c| c.starts_with(prefix))
    }
}

#[async_trait]
impl CloudApi for FakeCloud {
    async fn list_regions(&self) -> rigup_cloud::Result<Vec<Region>> {
        Ok(self.state.lock().unwrap().regions.clone())
    }

    async fn create_droplet(
        &self,
        request: &CreateDropletRequest,
    ) -> rigup_cloud::Result<Droplet> {
        let mut state = self.state.lock().unwrap();
        state.next_droplet_id += 1;
        let id = 100 + state.next_droplet_id;
        state.calls.push(format!("create_droplet:{}", request.name));
        let created = droplet(id, &request.name, &request.region);
        state.droplets.push(created.clone());
        Ok(created)
    }

    async fn get_droplet(&self, id: u64) -> rigup_cloud::Result<Droplet> {
        self.state
            .lock()
            .unwrap()
            .droplets
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(format!("droplet {id}")))
    }

    async fn delete_droplet(&self, id: u64) -> rigup_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete_droplet:{id}"));
        state.droplets.retain(|d| d.id != id);
        // Destroying a droplet releases its floating IPs and volumes.
        for ip in &mut state.floating_ips {
            if ip.droplet.as_ref().is_some_and(|d| d.id == id) {
                ip.droplet = None;
            }
        }
        for volume in &mut state.volumes {
            volume.droplet_ids.retain(|d| *d != id);
        }
        Ok(())
    }

    async fn shutdown_droplet(&self, id: u64) -> rigup_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("shutdown_droplet:{id}"));
        if let Some(droplet) = state.droplets.iter_mut().find(|d| d.id == id) {
            droplet.status = "off".to_string();
        }
        Ok(())
    }

    async fn create_volume(&self, request: &CreateVolumeRequest) -> rigup_cloud::Result<Volume> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_volume:{}", request.name));
        let created = Volume {
            id: format!("vol-{}", request.name),
            name: request.name.clone(),
            region: request.region.clone(),
            size_gigabytes: request.size_gigabytes,
            droplet_ids: Vec::new(),
        };
        state.volumes.push(created.clone());
        Ok(created)
    }

    async fn list_volumes(&self, region: &str) -> rigup_cloud::Result<Vec<Volume>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list_volumes:{region}"));
        Ok(state
            .volumes
            .iter()
            .filter(|v| v.region == region)
            .cloned()
            .collect())
    }

    async fn get_volume(&self, id: &str) -> rigup_cloud::Result<Volume> {
        self.state
            .lock()
            .unwrap()
            .volumes
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(format!("volume {id}")))
    }

    async fn detach_volume(
        &self,
        volume_id: &str,
        droplet_id: u64,
        _region: &str,
    ) -> rigup_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("detach_volume:{volume_id}:{droplet_id}"));
        if let Some(volume) = state.volumes.iter_mut().find(|v| v.id == volume_id) {
            volume.droplet_ids.retain(|d| *d != droplet_id);
        }
        Ok(())
    }

    async fn create_floating_ip(&self, region: &str) -> rigup_cloud::Result<FloatingIp> {
        let mut state = self.state.lock().unwrap();
        state.next_ip_octet += 1;
        state.calls.push(format!("create_floating_ip:{region}"));
        let created = floating_ip(&format!("198.51.100.{}", state.next_ip_octet), region, None);
        state.floating_ips.push(created.clone());
        Ok(created)
    }

    async fn list_floating_ips(&self) -> rigup_cloud::Result<Vec<FloatingIp>> {
        Ok(self.state.lock().unwrap().floating_ips.clone())
    }

    async fn get_floating_ip(&self, ip: &str) -> rigup_cloud::Result<FloatingIp> {
        self.state
            .lock()
            .unwrap()
            .floating_ips
            .iter()
            .find(|f| f.ip == ip)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(format!("floating IP {ip}")))
    }

    async fn assign_floating_ip(&self, ip: &str, droplet_id: u64) -> rigup_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("assign_floating_ip:{ip}:{droplet_id}"));
        let name = state
            .droplets
            .iter()
            .find(|d| d.id == droplet_id)
            .map(|d| d.name.clone())
            .unwrap_or_default();
        if let Some(floating) = state.floating_ips.iter_mut().find(|f| f.ip == ip) {
            floating.droplet = Some(AttachedDroplet {
                id: droplet_id,
                name,
            });
        }
        Ok(())
    }

    async fn unassign_floating_ip(&self, ip: &str) -> rigup_cloud::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("unassign_floating_ip:{ip}"));
        if let Some(floating) = state.floating_ips.iter_mut().find(|f| f.ip == ip) {
            floating.droplet = None;
        }
        Ok(())
    }
}

// ============ Scripted operator ============

pub enum Reply {
    Confirm(bool),
    Select(usize),
    Input(String),
    Password(String),
    Pause,
}

/// Plays back a fixed script of prompt replies. Any prompt the script does
/// not anticipate is a test failure: flows under test must not ask
/// questions their scenario says they will not ask.
pub struct ScriptedInteraction {
    replies: VecDeque<Reply>,
    pub prompts: Vec<String>,
}

impl ScriptedInteraction {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: replies.into(),
            prompts: Vec::new(),
        }
    }

    /// An operator that answers nothing; every prompt panics.
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    fn next(&mut self, message: &str) -> Reply {
        self.prompts.push(message.to_string());
        self.replies
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {message}"))
    }
}

impl Interaction for ScriptedInteraction {
    fn confirm(&mut self, message: &str) -> rigup_deploy::Result<bool> {
        match self.next(message) {
            Reply::Confirm(answer) => Ok(answer),
            _ => panic!("expected a confirm prompt, got: {message}"),
        }
    }

    fn select(&mut self, message: &str, items: &[String]) -> rigup_deploy::Result<usize> {
        match self.next(message) {
            Reply::Select(index) => {
                assert!(index < items.len(), "selection out of range for: {message}");
                Ok(index)
            }
            _ => panic!("expected a select prompt, got: {message}"),
        }
    }

    fn input(&mut self, message: &str) -> rigup_deploy::Result<String> {
        match self.next(message) {
            Reply::Input(text) => Ok(text),
            _ => panic!("expected an input prompt, got: {message}"),
        }
    }

    fn password(&mut self, message: &str) -> rigup_deploy::Result<String> {
        match self.next(message) {
            Reply::Password(text) => Ok(text),
            _ => panic!("expected a password prompt, got: {message}"),
        }
    }

    fn pause(&mut self, message: &str) -> rigup_deploy::Result<()> {
        match self.next(message) {
            Reply::Pause => Ok(()),
            _ => panic!("expected a pause prompt, got: {message}"),
        }
    }
}

// ============ Scripted remote shell ============

pub struct FakeShell {
    replies: Mutex<VecDeque<Result<ExecOutput, SshError>>>,
    pub commands: Mutex<Vec<String>>,
}

impl FakeShell {
    pub fn new(replies: Vec<Result<ExecOutput, SshError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

pub fn ok(stdout: &str) -> Result<ExecOutput, SshError> {
    Ok(ExecOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
    })
}

#[async_trait]
impl RemoteShell for FakeShell {
    async fn exec(&self, command: &str) -> Result<ExecOutput, SshError> {
        self.commands.lock().unwrap().push(command.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected remote command: {command}"))
    }
}
