//! 视图槽（描述符表）分配器
//!
//! 每个需要在着色器中访问的缓冲区 / 纹理都必须先在这里领取一个槽位。
//! 槽位从低到高单调分配；归还的槽位进入空闲列表，下次分配优先复用。

use crate::core::error::{RenderError, RenderResult};

/// 描述符表中的槽位索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewSlot(u32);

impl ViewSlot {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// CPU / GPU 侧描述符地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorHandle {
    pub cpu: u64,
    pub gpu: u64,
}

/// 固定容量的视图槽分配器
#[derive(Debug)]
pub struct ViewSlotAllocator {
    capacity: u32,
    descriptor_size: u32,
    cpu_base: u64,
    gpu_base: u64,
    /// 从未分配过的最小索引
    next_fresh: u32,
    /// 已归还的索引（LIFO）
    free_list: Vec<u32>,
    live: Vec<bool>,
}

impl ViewSlotAllocator {
    pub fn new(capacity: u32, descriptor_size: u32) -> Self {
        Self::with_heap_base(capacity, descriptor_size, 0, 0)
    }

    /// 指定 CPU / GPU 描述符堆起始地址
    pub fn with_heap_base(capacity: u32, descriptor_size: u32, cpu_base: u64, gpu_base: u64) -> Self {
        Self {
            capacity,
            descriptor_size,
            cpu_base,
            gpu_base,
            next_fresh: 0,
            free_list: Vec::new(),
            live: vec![false; capacity as usize],
        }
    }

    /// 分配一个槽位
    ///
    /// 容量耗尽属于不可恢复的资源错误，调用方应向上传播并终止。
    pub fn allocate(&mut self) -> RenderResult<ViewSlot> {
        let index = if let Some(index) = self.free_list.pop() {
            index
        } else if self.next_fresh < self.capacity {
            let index = self.next_fresh;
            self.next_fresh += 1;
            index
        } else {
            tracing::error!(
                target: "render",
                capacity = self.capacity,
                "View slot table exhausted"
            );
            return Err(RenderError::ViewSlotsExhausted {
                capacity: self.capacity,
            });
        };

        self.live[index as usize] = true;
        Ok(ViewSlot(index))
    }

    /// 归还槽位
    pub fn free(&mut self, slot: ViewSlot) -> RenderResult<()> {
        match self.live.get_mut(slot.0 as usize) {
            Some(live) if *live => {
                *live = false;
                self.free_list.push(slot.0);
                Ok(())
            }
            _ => Err(RenderError::InvalidViewSlot(slot.0)),
        }
    }

    pub fn is_live(&self, slot: ViewSlot) -> bool {
        self.live.get(slot.0 as usize).copied().unwrap_or(false)
    }

    /// 获取槽位的描述符地址，未分配的槽位返回 `None`
    pub fn handle(&self, slot: ViewSlot) -> Option<DescriptorHandle> {
        if !self.is_live(slot) {
            return None;
        }
        let offset = slot.0 as u64 * self.descriptor_size as u64;
        Some(DescriptorHandle {
            cpu: self.cpu_base + offset,
            gpu: self.gpu_base + offset,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn descriptor_size(&self) -> u32 {
        self.descriptor_size
    }

    /// 当前存活的槽位数
    pub fn allocated_count(&self) -> u32 {
        self.next_fresh - self.free_list.len() as u32
    }

    /// 是否还能继续分配
    pub fn is_below_capacity(&self) -> bool {
        !self.free_list.is_empty() || self.next_fresh < self.capacity
    }
}
