//! 图像生成器 - 基础设施层
//!
//! 外部生成能力的唯一接缝：输入源图片和提示词，输出图像或错误。
//! 编排层只认识这个 trait，不关心背后是真实模型还是测试替身。

use std::future::Future;

use futures::future::BoxFuture;

use crate::error::GenerationError;
use crate::models::{ImageRef, SourceImage};

/// 生成调用返回的 future
pub type GenerateFuture<'a> = BoxFuture<'a, Result<ImageRef, GenerationError>>;

/// 图像生成器
///
/// 职责：
/// - 对同样的输入可以被调用任意次数
/// - 不认识任务状态 / 批次
/// - 超时等策略由实现自己决定
pub trait ImageGenerator: Send + Sync {
    fn generate<'a>(&'a self, source: &'a SourceImage, prompt: &'a str) -> GenerateFuture<'a>;
}

/// 把异步闭包包装成生成器
pub struct FnGenerator<F>(F);

/// 用 `Fn(SourceImage, String) -> Future` 创建生成器
///
/// # 示例
/// ```
/// # use decade_portrait::infrastructure::generator_fn;
/// # use decade_portrait::models::ImageRef;
/// let generator = generator_fn(|_source, prompt| async move {
///     Ok(ImageRef::new(format!("mem://{}", prompt.len())))
/// });
/// # let _ = generator;
/// ```
pub fn generator_fn<F, Fut>(f: F) -> FnGenerator<F>
where
    F: Fn(SourceImage, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ImageRef, GenerationError>> + Send + 'static,
{
    FnGenerator(f)
}

impl<F, Fut> ImageGenerator for FnGenerator<F>
where
    F: Fn(SourceImage, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ImageRef, GenerationError>> + Send + 'static,
{
    fn generate<'a>(&'a self, source: &'a SourceImage, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin((self.0)(source.clone(), prompt.to_string()))
    }
}
