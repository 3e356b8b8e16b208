//! 模型状态句柄
//!
//! `EmbeddingEngine` 显式持有唯一的模型实例。查询路径只读取已发布的
//! [`ServingSnapshot`]；训练在独占锁内更新参数，完成后重新前向传播并
//! 原子替换快照。同一时刻只允许一个训练过程。

use candle_core::Device;
use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::config::{ModelConfig, TrainingConfig};
use crate::error::{AppError, Result};
use crate::graph::{GraphData, GraphIndex};
use crate::model::{EdgePlan, ModelDims, RgcnModel, snapshot};
use crate::services::similarity::{EmbeddingService, ServingSnapshot};
use crate::training::Trainer;

/// 训练日志间隔（轮）
const LOG_EVERY: usize = 10;

struct EngineCore {
    index: Arc<GraphIndex>,
    plan: Arc<EdgePlan>,
    model: RgcnModel,
    trainer: Trainer,
}

/// 一次训练过程的结果
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub run_id: String,
    pub epochs_requested: usize,
    pub epochs_completed: usize,
    pub losses: Vec<f32>,
    pub final_loss: Option<f32>,
    pub aborted: bool,
    pub model_saved: Option<String>,
}

/// 引擎状态
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub training: bool,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub num_relations: usize,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
    pub num_layers: usize,
    pub snapshot_version: u64,
}

pub struct EmbeddingEngine {
    model_config: ModelConfig,
    training_config: TrainingConfig,
    device: Device,
    core: Mutex<Option<EngineCore>>,
    serving: RwLock<Option<Arc<ServingSnapshot>>>,
    /// 正在运行的训练编号，0 表示空闲
    running: AtomicU64,
    /// 请求中止的训练编号
    abort_target: AtomicU64,
    episodes: AtomicU64,
    version: AtomicU64,
}

/// 训练结束（含出错返回）时清除运行标记
struct EpisodeGuard<'a>(&'a AtomicU64);

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        self.0.store(0, Ordering::SeqCst);
    }
}

impl EmbeddingEngine {
    pub fn new(model_config: ModelConfig, training_config: TrainingConfig) -> Self {
        Self {
            model_config,
            training_config,
            device: Device::Cpu,
            core: Mutex::new(None),
            serving: RwLock::new(None),
            running: AtomicU64::new(0),
            abort_target: AtomicU64::new(0),
            episodes: AtomicU64::new(0),
            version: AtomicU64::new(0),
        }
    }

    /// 由图数据构建索引、模型与训练器并发布首个快照
    ///
    /// 除非配置了 `force_retrain`，会尝试加载已保存的参数；加载失败时
    /// 记录警告并保留随机初始化的模型。
    pub fn initialize(&self, data: GraphData) -> Result<EngineStatus> {
        let mut guard = self.core.try_lock().ok_or(AppError::TrainingInProgress)?;

        let index = Arc::new(GraphIndex::build(&data)?);
        let plan = Arc::new(EdgePlan::new(
            index.edges(),
            index.num_nodes(),
            index.num_relations(),
            &self.device,
        )?);

        let dims = ModelDims {
            num_nodes: index.num_nodes(),
            num_relations: index.num_relations(),
            embedding_dim: self.model_config.embedding_dim,
            hidden_dim: self.model_config.hidden_dim,
            num_layers: self.model_config.num_layers,
        };
        let mut rng = match self.training_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let model = RgcnModel::new(dims, &mut rng, &self.device)?;
        self.restore_parameters(&model);

        let trainer = Trainer::new(&model, plan.clone(), &self.training_config)?;
        let core = EngineCore {
            index,
            plan,
            model,
            trainer,
        };
        self.publish(&core)?;
        *guard = Some(core);
        drop(guard);

        info!(
            "Engine initialized: {} nodes, {} edges, {} relations",
            dims.num_nodes,
            self.status().num_edges,
            dims.num_relations
        );
        Ok(self.status())
    }

    fn restore_parameters(&self, model: &RgcnModel) {
        let path = &self.model_config.model_path;
        if self.model_config.force_retrain {
            info!("force_retrain set, skipping saved parameters");
            return;
        }
        if !path.exists() {
            debug!("No saved parameters at {}", path.display());
            return;
        }
        if let Err(e) = snapshot::load(model, path) {
            warn!(
                "Failed to load saved parameters from {}: {}, using fresh initialization",
                path.display(),
                e
            );
        }
    }

    fn publish(&self, core: &EngineCore) -> Result<()> {
        let embeddings = core.model.embeddings(&core.plan)?;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(ServingSnapshot::new(core.index.clone(), embeddings, version));
        *self.serving.write() = Some(snapshot);
        debug!("Published serving snapshot v{}", version);
        Ok(())
    }

    /// 执行单轮训练并发布新快照
    pub fn train_epoch(&self) -> Result<f32> {
        let mut guard = self.core.try_lock().ok_or(AppError::TrainingInProgress)?;
        let core = guard
            .as_mut()
            .ok_or_else(|| AppError::UninitializedModel("engine has no graph".into()))?;

        let loss = core.trainer.train_epoch(&core.model)?;
        self.publish(core)?;
        Ok(loss)
    }

    /// 连续训练 `epochs` 轮
    ///
    /// 任一轮失败时恢复到训练前的参数并返回错误；被中止时已完成的轮次
    /// 保留。训练结束后发布新快照并保存参数。
    pub fn train(&self, epochs: usize) -> Result<TrainingReport> {
        let mut guard = self.core.try_lock().ok_or(AppError::TrainingInProgress)?;
        let core = guard
            .as_mut()
            .ok_or_else(|| AppError::UninitializedModel("engine has no graph".into()))?;

        let episode = self.episodes.fetch_add(1, Ordering::SeqCst) + 1;
        self.running.store(episode, Ordering::SeqCst);
        let _episode_guard = EpisodeGuard(&self.running);

        let run_id = Uuid::new_v4().to_string();
        let backup = core.model.export_parameters()?;
        info!(run_id = %run_id, epochs, "Training started");

        let mut losses = Vec::with_capacity(epochs);
        let mut aborted = false;
        for epoch in 0..epochs {
            if self.abort_target.load(Ordering::SeqCst) == episode {
                warn!(run_id = %run_id, epoch, "Training aborted");
                aborted = true;
                break;
            }

            match core.trainer.train_epoch(&core.model) {
                Ok(loss) => {
                    if (epoch + 1) % LOG_EVERY == 0 {
                        info!(run_id = %run_id, "Epoch {}/{}, Loss: {:.4}", epoch + 1, epochs, loss);
                    }
                    losses.push(loss);
                }
                Err(e) => {
                    error!(run_id = %run_id, epoch, "Training failed: {}", e);
                    core.model.import_parameters(&backup)?;
                    core.trainer =
                        Trainer::new(&core.model, core.plan.clone(), &self.training_config)?;
                    return Err(e);
                }
            }
        }

        self.publish(core)?;
        let model_saved = self.save_parameters(&core.model);
        let final_loss = losses.last().copied();
        info!(
            run_id = %run_id,
            epochs_completed = losses.len(),
            "Training finished, final loss {:?}",
            final_loss
        );

        Ok(TrainingReport {
            run_id,
            epochs_requested: epochs,
            epochs_completed: losses.len(),
            final_loss,
            losses,
            aborted,
            model_saved,
        })
    }

    fn save_parameters(&self, model: &RgcnModel) -> Option<String> {
        let path = &self.model_config.model_path;
        match snapshot::save(model, path) {
            Ok(()) => Some(path.display().to_string()),
            Err(e) => {
                warn!("Failed to save parameters to {}: {}", path.display(), e);
                None
            }
        }
    }

    /// 请求在下一轮开始前中止当前训练，返回是否有训练正在进行
    ///
    /// 中止请求绑定到当前训练编号，不会影响之后的训练。
    pub fn abort_training(&self) -> bool {
        let episode = self.running.load(Ordering::SeqCst);
        if episode == 0 {
            return false;
        }
        self.abort_target.store(episode, Ordering::SeqCst);
        true
    }

    /// 是否有多轮训练正在进行；初始化与单轮训练不计入
    pub fn is_training(&self) -> bool {
        self.running.load(Ordering::SeqCst) != 0
    }

    /// 获取绑定当前快照的查询服务
    pub fn service(&self) -> Result<EmbeddingService> {
        self.serving
            .read()
            .clone()
            .map(EmbeddingService::new)
            .ok_or(AppError::ModelUnavailable)
    }

    pub fn status(&self) -> EngineStatus {
        let serving = self.serving.read().clone();
        let (num_nodes, num_edges, num_relations, version) = serving
            .as_ref()
            .map(|s| {
                (
                    s.index.num_nodes(),
                    s.index.num_edges(),
                    s.index.num_relations(),
                    s.version,
                )
            })
            .unwrap_or_default();

        EngineStatus {
            model_loaded: serving.is_some(),
            training: self.is_training(),
            num_nodes,
            num_edges,
            num_relations,
            embedding_dim: self.model_config.embedding_dim,
            hidden_dim: self.model_config.hidden_dim,
            num_layers: self.model_config.num_layers,
            snapshot_version: version,
        }
    }

    pub fn default_epochs(&self) -> usize {
        self.training_config.epochs
    }
}

/// 创建模型状态句柄
pub fn create_embedding_engine(
    model_config: ModelConfig,
    training_config: TrainingConfig,
) -> Arc<EmbeddingEngine> {
    Arc::new(EmbeddingEngine::new(model_config, training_config))
}
